//! Focusable regions: grid shapes, edge policies and the handler seam UI code
//! implements.

use super::direction::Direction;
use super::scroll::ScrollRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RegionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Row count plus per-row column count; rows may be ragged or empty.
///
/// Coordinates always index the declared rows. Focus never rests on a
/// zero-width row: vertical moves and clamping skip over them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridShape {
    columns_per_row: Vec<usize>,
}

impl GridShape {
    pub fn new(columns_per_row: impl IntoIterator<Item = usize>) -> Self {
        Self {
            columns_per_row: columns_per_row.into_iter().collect(),
        }
    }

    pub fn uniform(rows: usize, cols: usize) -> Self {
        Self::new(std::iter::repeat(cols).take(rows))
    }

    /// One row of `cols` items
    pub fn row(cols: usize) -> Self {
        Self::uniform(1, cols)
    }

    /// One column of `rows` items
    pub fn column(rows: usize) -> Self {
        Self::uniform(rows, 1)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.columns_per_row.len()
    }

    pub fn columns_in(&self, row: usize) -> usize {
        self.columns_per_row.get(row).copied().unwrap_or(0)
    }

    /// True when no row has a column to focus
    pub fn is_empty(&self) -> bool {
        self.columns_per_row.iter().all(|&c| c == 0)
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.col < self.columns_in(at.row)
    }

    /// Nearest coordinate inside the shape, or none for an empty shape.
    /// Between two equally near non-empty rows the upper one wins.
    pub fn clamp(&self, at: Coord) -> Option<Coord> {
        let row = self
            .columns_per_row
            .iter()
            .enumerate()
            .filter(|(_, cols)| **cols > 0)
            .min_by_key(|(row, _)| row.abs_diff(at.row))
            .map(|(row, _)| row)?;
        let col = at.col.min(self.columns_in(row) - 1);
        Some(Coord { row, col })
    }

    // First non-empty row strictly above or below `row`
    fn next_row(&self, row: usize, dir: Direction) -> Option<usize> {
        match dir {
            Direction::Up => (0..row).rev().find(|&r| self.columns_in(r) > 0),
            Direction::Down => (row + 1..self.row_count()).find(|&r| self.columns_in(r) > 0),
            Direction::Left | Direction::Right => None,
        }
    }

    /// Neighbour of `at` towards `dir`, or none when `at` sits on that edge.
    /// Vertical moves skip zero-width rows and clamp the column to the new
    /// row's width.
    pub fn step(&self, at: Coord, dir: Direction) -> Option<Coord> {
        if dir.is_vertical() {
            let row = self.next_row(at.row, dir)?;
            return Some(Coord::new(row, at.col.min(self.columns_in(row) - 1)));
        }
        let target = match dir {
            Direction::Left => Coord::new(at.row, at.col.checked_sub(1)?),
            _ => Coord::new(at.row, at.col + 1),
        };
        self.contains(target).then_some(target)
    }

    /// Position reached by wrapping around the edge `dir` points at
    pub fn wrap(&self, at: Coord, dir: Direction) -> Option<Coord> {
        let last_row = self.row_count().checked_sub(1)?;
        let target = match dir {
            Direction::Up => Coord::new(last_row, at.col),
            Direction::Down => Coord::new(0, at.col),
            Direction::Left => Coord::new(at.row, self.columns_in(at.row).saturating_sub(1)),
            Direction::Right => Coord::new(at.row, 0),
        };
        self.clamp(target)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    #[default]
    Clamp,
    Wrap,
}

/// Declaration of a region, passed to `register_region` / `push_overlay`
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSpec {
    pub id: RegionId,
    pub shape: GridShape,
    pub policy: EdgePolicy,
    pub parent: Option<RegionId>,
    /// Edge that faces the parent; leaving through it escalates
    pub parent_edge: Option<Direction>,
    pub exits: BTreeMap<Direction, RegionId>,
    pub scrollable: bool,
    pub initial: Coord,
}

impl RegionSpec {
    pub fn new(id: impl Into<RegionId>, shape: GridShape) -> Self {
        Self {
            id: id.into(),
            shape,
            policy: EdgePolicy::Clamp,
            parent: None,
            parent_edge: None,
            exits: BTreeMap::new(),
            scrollable: false,
            initial: Coord::default(),
        }
    }

    pub fn with_policy(mut self, policy: EdgePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parent reached by Back, and by moving out through `edge` if given
    pub fn with_parent(mut self, parent: impl Into<RegionId>, edge: Option<Direction>) -> Self {
        self.parent = Some(parent.into());
        self.parent_edge = edge;
        self
    }

    pub fn with_exit(mut self, dir: Direction, target: impl Into<RegionId>) -> Self {
        self.exits.insert(dir, target.into());
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn starting_at(mut self, at: Coord) -> Self {
        self.initial = at;
        self
    }
}

/// What a region wants done after confirm
pub enum ConfirmResponse {
    Handled,
    Ignored,
    /// Open a modal region that captures every signal until closed
    PushOverlay(Overlay),
    /// Close the overlay this confirm was delivered to
    CloseOverlay,
}

impl fmt::Debug for ConfirmResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmResponse::Handled => write!(f, "Handled"),
            ConfirmResponse::Ignored => write!(f, "Ignored"),
            ConfirmResponse::PushOverlay(overlay) => {
                f.debug_tuple("PushOverlay").field(overlay).finish()
            }
            ConfirmResponse::CloseOverlay => write!(f, "CloseOverlay"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackResponse {
    Consumed,
    /// Let the controller close the overlay or move to the parent
    Default,
}

/// UI side of a region. Only `on_confirm` is required.
pub trait RegionHandler: Send {
    fn on_confirm(&mut self, at: Coord) -> ConfirmResponse;

    fn on_back(&mut self, _at: Coord) -> BackResponse {
        BackResponse::Default
    }

    fn on_focus_moved(&mut self, _from: Coord, _to: Coord) {}

    fn on_focus_gained(&mut self, _at: Coord) {}

    fn on_scroll_request(&mut self, _request: &ScrollRequest) {}
}

impl<F> RegionHandler for F
where
    F: FnMut(Coord) -> ConfirmResponse + Send,
{
    fn on_confirm(&mut self, at: Coord) -> ConfirmResponse {
        self(at)
    }
}

pub struct Overlay {
    pub spec: RegionSpec,
    pub handler: Box<dyn RegionHandler>,
}

impl Overlay {
    pub fn new(spec: RegionSpec, handler: impl RegionHandler + 'static) -> Self {
        Self {
            spec,
            handler: Box::new(handler),
        }
    }
}

impl fmt::Debug for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay").field("spec", &self.spec).finish()
    }
}

/// Live region: declaration, current coordinate and handler
pub(crate) struct Region {
    pub(crate) spec: RegionSpec,
    pub(crate) coord: Coord,
    pub(crate) handler: Box<dyn RegionHandler>,
}

impl Region {
    pub(crate) fn new(spec: RegionSpec, handler: Box<dyn RegionHandler>) -> Self {
        let coord = spec.shape.clamp(spec.initial).unwrap_or_default();
        Self {
            spec,
            coord,
            handler,
        }
    }

    pub(crate) fn id(&self) -> &RegionId {
        &self.spec.id
    }

    /// Installs a new shape; returns the clamped coordinate when it differs
    /// from the current one. The caller moves focus there.
    pub(crate) fn set_shape(&mut self, shape: GridShape) -> Option<Coord> {
        let clamped = shape.clamp(self.coord);
        self.spec.shape = shape;
        match clamped {
            Some(to) if to != self.coord => Some(to),
            Some(_) => None,
            None => {
                self.coord = Coord::default();
                None
            }
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.spec.id)
            .field("coord", &self.coord)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_vertical_moves_clamp_column() {
        let shape = GridShape::new([4, 2, 3]);
        assert_eq!(
            shape.step(Coord::new(0, 3), Direction::Down),
            Some(Coord::new(1, 1))
        );
        assert_eq!(
            shape.step(Coord::new(1, 1), Direction::Down),
            Some(Coord::new(2, 1))
        );
        assert_eq!(shape.step(Coord::new(2, 1), Direction::Down), None);
    }

    #[test]
    fn horizontal_moves_stop_at_row_end() {
        let shape = GridShape::new([3, 1]);
        assert_eq!(shape.step(Coord::new(0, 2), Direction::Right), None);
        assert_eq!(shape.step(Coord::new(0, 0), Direction::Left), None);
        assert_eq!(
            shape.step(Coord::new(0, 1), Direction::Left),
            Some(Coord::new(0, 0))
        );
    }

    #[test]
    fn wrap_lands_on_opposite_edge() {
        let shape = GridShape::new([3, 2]);
        assert_eq!(
            shape.wrap(Coord::new(0, 2), Direction::Up),
            Some(Coord::new(1, 1))
        );
        assert_eq!(
            shape.wrap(Coord::new(1, 1), Direction::Right),
            Some(Coord::new(1, 0))
        );
        assert_eq!(
            shape.wrap(Coord::new(0, 0), Direction::Left),
            Some(Coord::new(0, 2))
        );
    }

    #[test]
    fn clamp_pulls_into_shrunk_shape() {
        let shape = GridShape::uniform(2, 2);
        assert_eq!(shape.clamp(Coord::new(5, 7)), Some(Coord::new(1, 1)));
        assert_eq!(GridShape::empty().clamp(Coord::new(0, 0)), None);
    }

    #[test]
    fn zero_width_rows_keep_their_index() {
        let shape = GridShape::new([3, 0, 2]);
        assert_eq!(shape.row_count(), 3);
        assert!(!shape.is_empty());
        assert_eq!(
            shape.step(Coord::new(0, 2), Direction::Down),
            Some(Coord::new(2, 1))
        );
        assert_eq!(
            shape.step(Coord::new(2, 0), Direction::Up),
            Some(Coord::new(0, 0))
        );
        assert_eq!(shape.step(Coord::new(2, 0), Direction::Down), None);
    }

    #[test]
    fn clamp_and_wrap_skip_zero_width_rows() {
        let shape = GridShape::new([0, 2, 0, 0, 1, 0]);
        assert_eq!(shape.clamp(Coord::new(0, 5)), Some(Coord::new(1, 1)));
        assert_eq!(shape.clamp(Coord::new(5, 0)), Some(Coord::new(4, 0)));
        assert_eq!(
            shape.wrap(Coord::new(1, 1), Direction::Up),
            Some(Coord::new(4, 0))
        );
        assert_eq!(
            shape.wrap(Coord::new(4, 0), Direction::Down),
            Some(Coord::new(1, 0))
        );
        assert_eq!(shape.step(Coord::new(1, 0), Direction::Up), None);
    }

    #[test]
    fn only_all_zero_shapes_are_empty() {
        assert!(GridShape::new([0, 0]).is_empty());
        assert!(GridShape::empty().is_empty());
        assert_eq!(GridShape::new([0, 0]).clamp(Coord::new(0, 0)), None);
    }

    #[test]
    fn region_starts_inside_shape() {
        let spec = RegionSpec::new("grid", GridShape::uniform(2, 2)).starting_at(Coord::new(9, 9));
        let region = Region::new(spec, Box::new(|_: Coord| ConfirmResponse::Handled));
        assert_eq!(region.coord, Coord::new(1, 1));
    }
}
