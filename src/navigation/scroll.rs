use super::region::{Coord, RegionId};

/// Fraction of the viewport above the focused element after a look-ahead
/// scroll, so the next few items stay visible.
pub const LOOKAHEAD_ANCHOR: f32 = 0.3;

/// Sent to a scrollable region whenever its focused coordinate changes
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollRequest {
    pub region: RegionId,
    pub coord: Coord,
    pub anchor: f32,
}

impl ScrollRequest {
    pub fn new(region: RegionId, coord: Coord) -> Self {
        Self {
            region,
            coord,
            anchor: LOOKAHEAD_ANCHOR,
        }
    }

    /// Offset the region should scroll to; see [`lookahead_offset`]
    pub fn offset_for(&self, element_start: f32, viewport: f32, content: f32) -> f32 {
        lookahead_offset(element_start, viewport, content, self.anchor)
    }
}

/// Scroll offset that puts `element_start` at `anchor * viewport` from the top
/// of the container, kept within `0..=content - viewport`.
pub fn lookahead_offset(element_start: f32, viewport: f32, content: f32, anchor: f32) -> f32 {
    let max_offset = (content - viewport).max(0.0);
    let target = element_start - anchor.clamp(0.0, 1.0) * viewport;
    target.clamp(0.0, max_offset)
}
