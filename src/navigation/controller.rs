//! Hierarchical focus state machine.
//!
//! Exactly one region is active: the top overlay if any is open, else the
//! base focus. Every signal goes to the active region only.
//!
//! Leaving a base region through an edge is resolved in this order:
//! 1. the edge facing the parent escalates focus to the parent
//! 2. an exit link declared for that direction
//! 3. wrap, if the region's policy wraps
//! 4. otherwise the move is ignored
//!
//! Overlays capture all signals, so they never escalate or follow exits.

use super::direction::Direction;
use super::region::{
    BackResponse, ConfirmResponse, Coord, EdgePolicy, GridShape, Overlay, Region, RegionHandler,
    RegionId, RegionSpec,
};
use super::scroll::ScrollRequest;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default confirm suppression after a focus change
pub const DEFAULT_GUARD_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavError {
    #[error("Region already registered: {0}")]
    DuplicateRegion(RegionId),

    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),

    #[error("Region {region} names unknown parent {parent}")]
    UnknownParent { region: RegionId, parent: RegionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavSignal {
    Direction(Direction),
    Confirm,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Disabled,
    NoActiveRegion,
    GuardWindow,
    EmptyRegion,
}

/// What a signal did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Moved {
        region: RegionId,
        from: Coord,
        to: Coord,
    },
    FocusChanged {
        from: RegionId,
        to: RegionId,
    },
    Confirmed {
        region: RegionId,
        at: Coord,
    },
    OverlayOpened(RegionId),
    OverlayClosed(RegionId),
    BackConsumed(RegionId),
    Ignored,
    Dropped(DropReason),
}

#[derive(Debug)]
pub struct NavigationController {
    regions: HashMap<RegionId, Region>,
    overlays: Vec<Region>,
    base_focus: Option<RegionId>,
    enabled: bool,
    guard_window: Duration,
    focus_gained_at: Option<Instant>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(DEFAULT_GUARD_WINDOW)
    }
}

impl NavigationController {
    pub fn new(guard_window: Duration) -> Self {
        Self {
            regions: HashMap::new(),
            overlays: Vec::new(),
            base_focus: None,
            enabled: true,
            guard_window,
            focus_gained_at: None,
        }
    }

    pub fn set_guard_window(&mut self, guard_window: Duration) {
        self.guard_window = guard_window;
    }

    fn is_known(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id) || self.overlays.iter().any(|o| o.id() == id)
    }

    /// Mounts a base region. Its parent, if any, must already be registered.
    pub fn register_region(
        &mut self,
        spec: RegionSpec,
        handler: impl RegionHandler + 'static,
    ) -> Result<(), NavError> {
        if self.is_known(&spec.id) {
            return Err(NavError::DuplicateRegion(spec.id));
        }
        if let Some(parent) = &spec.parent {
            if !self.regions.contains_key(parent) {
                return Err(NavError::UnknownParent {
                    region: spec.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        debug!("Registering region {}", spec.id);
        let id = spec.id.clone();
        self.regions.insert(id, Region::new(spec, Box::new(handler)));
        Ok(())
    }

    /// Unmounts a base region or removes an overlay from the stack.
    ///
    /// Removing the focused base region moves focus to its parent when that
    /// is still registered, else clears focus.
    pub fn unregister_region(&mut self, id: &RegionId, now: Instant) -> Result<(), NavError> {
        if self.overlays.iter().any(|o| o.id() == id) {
            return self.dismiss_overlay(id, now);
        }
        let region = self
            .regions
            .remove(id)
            .ok_or_else(|| NavError::UnknownRegion(id.clone()))?;
        debug!("Unregistered region {}", id);

        if self.base_focus.as_ref() == Some(id) {
            self.base_focus = None;
            match region.spec.parent {
                Some(parent) if self.regions.contains_key(&parent) => {
                    self.gain_focus(parent, now);
                }
                _ => info!("Focused region {} removed, no region has focus", id),
            }
        }
        Ok(())
    }

    /// Replaces a region's shape, clamping its coordinate into the new one.
    /// A clamped coordinate is reported like any other move.
    pub fn set_shape(&mut self, id: &RegionId, shape: GridShape) -> Result<(), NavError> {
        let region = self
            .region_mut(id)
            .ok_or_else(|| NavError::UnknownRegion(id.clone()))?;
        if let Some(to) = region.set_shape(shape) {
            let from = region.coord;
            debug!("Region {} clamped from {} to {}", id, from, to);
            Self::move_within(region, from, to);
        }
        Ok(())
    }

    /// Makes `id` the base focus
    pub fn focus(&mut self, id: &RegionId, now: Instant) -> Result<(), NavError> {
        if !self.regions.contains_key(id) {
            return Err(NavError::UnknownRegion(id.clone()));
        }
        self.gain_focus(id.clone(), now);
        Ok(())
    }

    /// Opens a modal region on top of the stack
    pub fn push_overlay(&mut self, overlay: Overlay, now: Instant) -> Result<RegionId, NavError> {
        let Overlay { spec, handler } = overlay;
        if self.is_known(&spec.id) {
            return Err(NavError::DuplicateRegion(spec.id));
        }
        let id = spec.id.clone();
        info!("Opening overlay {}", id);
        let mut region = Region::new(spec, handler);
        region.handler.on_focus_gained(region.coord);
        self.overlays.push(region);
        self.focus_gained_at = Some(now);
        Ok(id)
    }

    /// Closes the overlay `id` wherever it sits in the stack
    pub fn dismiss_overlay(&mut self, id: &RegionId, now: Instant) -> Result<(), NavError> {
        let position = self
            .overlays
            .iter()
            .position(|o| o.id() == id)
            .ok_or_else(|| NavError::UnknownRegion(id.clone()))?;
        let was_top = position + 1 == self.overlays.len();
        self.overlays.remove(position);
        info!("Closed overlay {}", id);
        if was_top {
            self.regain_active(now);
        }
        Ok(())
    }

    fn pop_overlay(&mut self, now: Instant) -> Option<RegionId> {
        let region = self.overlays.pop()?;
        info!("Closed overlay {}", region.id());
        self.regain_active(now);
        Some(region.spec.id)
    }

    /// Disabling drops every signal; re-enabling arms the guard window
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if enabled && !self.enabled {
            self.focus_gained_at = Some(now);
        }
        if enabled != self.enabled {
            info!("Navigation {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_region(&self) -> Option<&RegionId> {
        self.active().map(Region::id)
    }

    pub fn base_focus(&self) -> Option<&RegionId> {
        self.base_focus.as_ref()
    }

    pub fn coord(&self, id: &RegionId) -> Option<Coord> {
        self.regions
            .get(id)
            .or_else(|| self.overlays.iter().find(|o| o.id() == id))
            .map(|r| r.coord)
    }

    pub fn overlay_depth(&self) -> usize {
        self.overlays.len()
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.is_known(id)
    }

    pub fn handle(&mut self, signal: NavSignal, now: Instant) -> NavOutcome {
        match signal {
            NavSignal::Direction(dir) => self.handle_direction(dir, now),
            NavSignal::Confirm => self.handle_confirm(now),
            NavSignal::Back => self.handle_back(now),
        }
    }

    pub fn handle_direction(&mut self, dir: Direction, now: Instant) -> NavOutcome {
        if !self.enabled {
            return NavOutcome::Dropped(DropReason::Disabled);
        }
        let in_overlay = !self.overlays.is_empty();
        let Some(region) = self.active_mut() else {
            return NavOutcome::Dropped(DropReason::NoActiveRegion);
        };
        if region.spec.shape.is_empty() {
            return NavOutcome::Dropped(DropReason::EmptyRegion);
        }

        let from = region.coord;
        if let Some(to) = region.spec.shape.step(from, dir) {
            return Self::move_within(region, from, to);
        }

        // At the edge
        if !in_overlay {
            let spec = &region.spec;
            let target = match (&spec.parent, spec.parent_edge) {
                (Some(parent), Some(edge)) if edge == dir => Some(parent.clone()),
                _ => spec.exits.get(&dir).cloned(),
            };
            let wraps = spec.policy == EdgePolicy::Wrap;
            let source = spec.id.clone();
            if let Some(target) = target {
                if self.regions.contains_key(&target) {
                    debug!("Leaving {} {} towards {}", source, dir, target);
                    self.gain_focus(target.clone(), now);
                    return NavOutcome::FocusChanged {
                        from: source,
                        to: target,
                    };
                }
                warn!("Region {} points {} at unknown region {}", source, dir, target);
            }
            if !wraps {
                return NavOutcome::Ignored;
            }
        }

        let Some(region) = self.active_mut() else {
            return NavOutcome::Dropped(DropReason::NoActiveRegion);
        };
        if region.spec.policy != EdgePolicy::Wrap {
            return NavOutcome::Ignored;
        }
        match region.spec.shape.wrap(from, dir) {
            Some(to) if to != from => Self::move_within(region, from, to),
            _ => NavOutcome::Ignored,
        }
    }

    fn move_within(region: &mut Region, from: Coord, to: Coord) -> NavOutcome {
        region.coord = to;
        region.handler.on_focus_moved(from, to);
        if region.spec.scrollable {
            let request = ScrollRequest::new(region.spec.id.clone(), to);
            region.handler.on_scroll_request(&request);
        }
        NavOutcome::Moved {
            region: region.spec.id.clone(),
            from,
            to,
        }
    }

    pub fn handle_confirm(&mut self, now: Instant) -> NavOutcome {
        if !self.enabled {
            return NavOutcome::Dropped(DropReason::Disabled);
        }
        if self.active().is_none() {
            return NavOutcome::Dropped(DropReason::NoActiveRegion);
        }
        if let Some(gained) = self.focus_gained_at {
            if now.saturating_duration_since(gained) < self.guard_window {
                debug!("Confirm dropped inside guard window");
                return NavOutcome::Dropped(DropReason::GuardWindow);
            }
        }
        let Some(region) = self.active_mut() else {
            return NavOutcome::Dropped(DropReason::NoActiveRegion);
        };
        if region.spec.shape.is_empty() {
            return NavOutcome::Dropped(DropReason::EmptyRegion);
        }

        let at = region.coord;
        let id = region.spec.id.clone();
        match region.handler.on_confirm(at) {
            ConfirmResponse::Handled => NavOutcome::Confirmed { region: id, at },
            ConfirmResponse::Ignored => NavOutcome::Ignored,
            ConfirmResponse::PushOverlay(overlay) => match self.push_overlay(overlay, now) {
                Ok(opened) => NavOutcome::OverlayOpened(opened),
                Err(e) => {
                    warn!("Region {} tried to open overlay: {}", id, e);
                    NavOutcome::Ignored
                }
            },
            ConfirmResponse::CloseOverlay => match self.pop_overlay(now) {
                Some(closed) => NavOutcome::OverlayClosed(closed),
                None => NavOutcome::Ignored,
            },
        }
    }

    pub fn handle_back(&mut self, now: Instant) -> NavOutcome {
        if !self.enabled {
            return NavOutcome::Dropped(DropReason::Disabled);
        }
        let Some(region) = self.active_mut() else {
            return NavOutcome::Dropped(DropReason::NoActiveRegion);
        };
        let at = region.coord;
        if region.handler.on_back(at) == BackResponse::Consumed {
            return NavOutcome::BackConsumed(region.spec.id.clone());
        }

        if let Some(closed) = self.pop_overlay(now) {
            return NavOutcome::OverlayClosed(closed);
        }

        let Some(current) = self.base_focus.clone() else {
            return NavOutcome::Ignored;
        };
        let parent = self
            .regions
            .get(&current)
            .and_then(|r| r.spec.parent.clone())
            .filter(|p| self.regions.contains_key(p));
        match parent {
            Some(parent) => {
                self.gain_focus(parent.clone(), now);
                NavOutcome::FocusChanged {
                    from: current,
                    to: parent,
                }
            }
            None => NavOutcome::Ignored,
        }
    }

    fn active(&self) -> Option<&Region> {
        match self.overlays.last() {
            Some(top) => Some(top),
            None => self.base_focus.as_ref().and_then(|id| self.regions.get(id)),
        }
    }

    fn active_mut(&mut self) -> Option<&mut Region> {
        match self.overlays.last_mut() {
            Some(top) => Some(top),
            None => match &self.base_focus {
                Some(id) => self.regions.get_mut(id),
                None => None,
            },
        }
    }

    fn region_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        match self.regions.get_mut(id) {
            Some(region) => Some(region),
            None => self.overlays.iter_mut().find(|o| o.id() == id),
        }
    }

    // Base focus moves; the new region keeps the coordinate it had
    fn gain_focus(&mut self, id: RegionId, now: Instant) {
        debug!("Focus -> {}", id);
        self.base_focus = Some(id);
        self.focus_gained_at = Some(now);
        if self.overlays.is_empty() {
            if let Some(region) = self.active_mut() {
                region.handler.on_focus_gained(region.coord);
            }
        }
    }

    fn regain_active(&mut self, now: Instant) {
        self.focus_gained_at = Some(now);
        if let Some(region) = self.active_mut() {
            region.handler.on_focus_gained(region.coord);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn ok(_: Coord) -> ConfirmResponse {
        ConfirmResponse::Handled
    }

    fn id(s: &str) -> RegionId {
        RegionId::new(s)
    }

    // Settled well past any guard window
    fn later(start: Instant) -> Instant {
        start + Duration::from_secs(1)
    }

    fn sections_and_grid() -> (NavigationController, Instant) {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.register_region(RegionSpec::new("sections", GridShape::row(4)), ok)
            .unwrap();
        nav.register_region(
            RegionSpec::new("grid", GridShape::uniform(3, 3))
                .with_parent("sections", Some(Direction::Up)),
            ok,
        )
        .unwrap();
        nav.focus(&id("grid"), start).unwrap();
        (nav, start)
    }

    #[test]
    fn direction_moves_active_region_only() {
        let (mut nav, start) = sections_and_grid();
        let out = nav.handle(NavSignal::Direction(Direction::Right), start);
        assert_eq!(
            out,
            NavOutcome::Moved {
                region: id("grid"),
                from: Coord::new(0, 0),
                to: Coord::new(0, 1)
            }
        );
        assert_eq!(nav.coord(&id("sections")), Some(Coord::new(0, 0)));
    }

    #[test]
    fn escalation_keeps_child_coordinate() {
        let (mut nav, start) = sections_and_grid();
        nav.handle_direction(Direction::Right, start);
        nav.handle_direction(Direction::Right, start);
        let out = nav.handle_direction(Direction::Up, start);

        assert_eq!(
            out,
            NavOutcome::FocusChanged {
                from: id("grid"),
                to: id("sections")
            }
        );
        assert_eq!(nav.active_region(), Some(&id("sections")));
        assert_eq!(nav.coord(&id("grid")), Some(Coord::new(0, 2)));
    }

    #[test]
    fn clamp_policy_ignores_moves_past_edge() {
        let (mut nav, start) = sections_and_grid();
        assert_eq!(nav.handle_direction(Direction::Left, start), NavOutcome::Ignored);
        assert_eq!(nav.coord(&id("grid")), Some(Coord::new(0, 0)));
    }

    #[test]
    fn wrap_policy_wraps() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.register_region(
            RegionSpec::new("menu", GridShape::column(3)).with_policy(EdgePolicy::Wrap),
            ok,
        )
        .unwrap();
        nav.focus(&id("menu"), start).unwrap();

        assert_eq!(
            nav.handle_direction(Direction::Up, start),
            NavOutcome::Moved {
                region: id("menu"),
                from: Coord::new(0, 0),
                to: Coord::new(2, 0)
            }
        );
    }

    #[test]
    fn exit_link_moves_focus() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.register_region(RegionSpec::new("sidebar", GridShape::column(2)), ok)
            .unwrap();
        nav.register_region(
            RegionSpec::new("main", GridShape::uniform(2, 2)).with_exit(Direction::Left, "sidebar"),
            ok,
        )
        .unwrap();
        nav.focus(&id("main"), start).unwrap();

        assert_eq!(
            nav.handle_direction(Direction::Left, start),
            NavOutcome::FocusChanged {
                from: id("main"),
                to: id("sidebar")
            }
        );
    }

    #[test]
    fn guard_window_drops_early_confirm() {
        let (mut nav, start) = sections_and_grid();
        assert_eq!(
            nav.handle_confirm(start + Duration::from_millis(50)),
            NavOutcome::Dropped(DropReason::GuardWindow)
        );
        assert_eq!(
            nav.handle_confirm(start + Duration::from_millis(250)),
            NavOutcome::Confirmed {
                region: id("grid"),
                at: Coord::new(0, 0)
            }
        );
    }

    #[test]
    fn reenabling_arms_guard_window() {
        let (mut nav, start) = sections_and_grid();
        let t = later(start);
        nav.set_enabled(false, t);
        assert_eq!(
            nav.handle_direction(Direction::Down, t),
            NavOutcome::Dropped(DropReason::Disabled)
        );
        nav.set_enabled(true, t);
        assert_eq!(
            nav.handle_confirm(t + Duration::from_millis(50)),
            NavOutcome::Dropped(DropReason::GuardWindow)
        );
        assert!(matches!(
            nav.handle_confirm(t + Duration::from_millis(250)),
            NavOutcome::Confirmed { .. }
        ));
    }

    #[test]
    fn overlay_captures_signals_until_back() {
        let (mut nav, start) = sections_and_grid();
        let t = later(start);
        nav.push_overlay(
            Overlay::new(RegionSpec::new("dialog", GridShape::row(2)), ok),
            t,
        )
        .unwrap();

        assert_eq!(nav.active_region(), Some(&id("dialog")));
        assert!(matches!(
            nav.handle_direction(Direction::Right, t),
            NavOutcome::Moved { ref region, .. } if *region == id("dialog")
        ));
        // Overlays never escalate
        assert_eq!(nav.handle_direction(Direction::Up, t), NavOutcome::Ignored);

        assert_eq!(
            nav.handle_back(t),
            NavOutcome::OverlayClosed(id("dialog"))
        );
        assert_eq!(nav.active_region(), Some(&id("grid")));
    }

    #[test]
    fn confirm_can_open_and_close_overlay() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.register_region(RegionSpec::new("list", GridShape::column(5)), |_: Coord| {
            let dialog = RegionSpec::new("confirm-dialog", GridShape::row(2));
            ConfirmResponse::PushOverlay(Overlay::new(dialog, |_: Coord| {
                ConfirmResponse::CloseOverlay
            }))
        })
        .unwrap();
        nav.focus(&id("list"), start).unwrap();

        let t = later(start);
        assert_eq!(
            nav.handle_confirm(t),
            NavOutcome::OverlayOpened(id("confirm-dialog"))
        );
        // opening the overlay armed the guard
        assert_eq!(
            nav.handle_confirm(t + Duration::from_millis(10)),
            NavOutcome::Dropped(DropReason::GuardWindow)
        );
        assert_eq!(
            nav.handle_confirm(later(t)),
            NavOutcome::OverlayClosed(id("confirm-dialog"))
        );
        assert_eq!(nav.overlay_depth(), 0);
    }

    #[test]
    fn back_moves_to_parent_without_overlay() {
        let (mut nav, start) = sections_and_grid();
        assert_eq!(
            nav.handle_back(start),
            NavOutcome::FocusChanged {
                from: id("grid"),
                to: id("sections")
            }
        );
        assert_eq!(nav.handle_back(start), NavOutcome::Ignored);
    }

    struct Consumer;

    impl RegionHandler for Consumer {
        fn on_confirm(&mut self, _at: Coord) -> ConfirmResponse {
            ConfirmResponse::Ignored
        }

        fn on_back(&mut self, _at: Coord) -> BackResponse {
            BackResponse::Consumed
        }
    }

    #[test]
    fn handler_can_consume_back() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.register_region(RegionSpec::new("root", GridShape::row(1)), ok)
            .unwrap();
        nav.register_region(
            RegionSpec::new("editor", GridShape::row(1)).with_parent("root", None),
            Consumer,
        )
        .unwrap();
        nav.focus(&id("editor"), start).unwrap();
        assert_eq!(nav.handle_back(start), NavOutcome::BackConsumed(id("editor")));
        assert_eq!(nav.active_region(), Some(&id("editor")));
    }

    #[test]
    fn empty_region_ignores_direction_and_confirm() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.register_region(RegionSpec::new("empty", GridShape::empty()), ok)
            .unwrap();
        nav.focus(&id("empty"), start).unwrap();
        assert_eq!(
            nav.handle_direction(Direction::Down, start),
            NavOutcome::Dropped(DropReason::EmptyRegion)
        );
        assert_eq!(
            nav.handle_confirm(later(start)),
            NavOutcome::Dropped(DropReason::EmptyRegion)
        );
    }

    #[test]
    fn no_active_region_drops_signals() {
        let mut nav = NavigationController::default();
        let now = Instant::now();
        assert_eq!(
            nav.handle(NavSignal::Confirm, now),
            NavOutcome::Dropped(DropReason::NoActiveRegion)
        );
        assert_eq!(
            nav.handle(NavSignal::Back, now),
            NavOutcome::Dropped(DropReason::NoActiveRegion)
        );
    }

    #[test]
    fn registration_errors() {
        let (mut nav, _) = sections_and_grid();
        assert_eq!(
            nav.register_region(RegionSpec::new("grid", GridShape::row(1)), ok),
            Err(NavError::DuplicateRegion(id("grid")))
        );
        assert_eq!(
            nav.register_region(
                RegionSpec::new("orphan", GridShape::row(1)).with_parent("missing", None),
                ok
            ),
            Err(NavError::UnknownParent {
                region: id("orphan"),
                parent: id("missing")
            })
        );
        assert_eq!(
            nav.focus(&id("missing"), Instant::now()),
            Err(NavError::UnknownRegion(id("missing")))
        );
    }

    #[test]
    fn unregistering_focused_region_falls_back_to_parent() {
        let (mut nav, start) = sections_and_grid();
        nav.unregister_region(&id("grid"), start).unwrap();
        assert_eq!(nav.active_region(), Some(&id("sections")));

        nav.unregister_region(&id("sections"), start).unwrap();
        assert_eq!(nav.active_region(), None);
    }

    #[test]
    fn shrinking_shape_clamps_coordinate() {
        let (mut nav, start) = sections_and_grid();
        nav.handle_direction(Direction::Down, start);
        nav.handle_direction(Direction::Down, start);
        nav.handle_direction(Direction::Right, start);
        assert_eq!(nav.coord(&id("grid")), Some(Coord::new(2, 1)));

        nav.set_shape(&id("grid"), GridShape::new([3, 1])).unwrap();
        assert_eq!(nav.coord(&id("grid")), Some(Coord::new(1, 0)));
    }

    #[test]
    fn dismiss_overlay_by_id() {
        let (mut nav, start) = sections_and_grid();
        nav.push_overlay(Overlay::new(RegionSpec::new("a", GridShape::row(1)), ok), start)
            .unwrap();
        nav.push_overlay(Overlay::new(RegionSpec::new("b", GridShape::row(1)), ok), start)
            .unwrap();

        nav.dismiss_overlay(&id("a"), start).unwrap();
        assert_eq!(nav.overlay_depth(), 1);
        assert_eq!(nav.active_region(), Some(&id("b")));
        assert_eq!(
            nav.dismiss_overlay(&id("a"), start),
            Err(NavError::UnknownRegion(id("a")))
        );
    }

    struct ScrollRecorder(Arc<Mutex<Vec<ScrollRequest>>>);

    impl RegionHandler for ScrollRecorder {
        fn on_confirm(&mut self, _at: Coord) -> ConfirmResponse {
            ConfirmResponse::Handled
        }

        fn on_focus_moved(&mut self, from: Coord, to: Coord) {
            assert_ne!(from, to);
        }

        fn on_scroll_request(&mut self, request: &ScrollRequest) {
            self.0.lock().unwrap().push(request.clone());
        }
    }

    #[test]
    fn scrollable_region_gets_scroll_requests() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        nav.register_region(
            RegionSpec::new("feed", GridShape::column(10)).scrollable(),
            ScrollRecorder(seen.clone()),
        )
        .unwrap();
        nav.focus(&id("feed"), start).unwrap();

        nav.handle_direction(Direction::Down, start);
        nav.handle_direction(Direction::Up, start);
        nav.handle_direction(Direction::Up, start); // blocked, no request

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].coord, Coord::new(1, 0));
        assert_eq!(seen[1].coord, Coord::new(0, 0));
    }

    #[test]
    fn shrinking_scrollable_region_requests_scroll() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));
        nav.register_region(
            RegionSpec::new("feed", GridShape::column(10))
                .scrollable()
                .starting_at(Coord::new(8, 0)),
            ScrollRecorder(seen.clone()),
        )
        .unwrap();
        nav.focus(&id("feed"), start).unwrap();

        nav.set_shape(&id("feed"), GridShape::column(12)).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        nav.set_shape(&id("feed"), GridShape::column(4)).unwrap();
        assert_eq!(nav.coord(&id("feed")), Some(Coord::new(3, 0)));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].coord, Coord::new(3, 0));
    }

    #[test]
    fn confirm_reports_declared_row_past_empty_row() {
        let mut nav = NavigationController::default();
        let start = Instant::now();
        let confirmed = Arc::new(Mutex::new(Vec::new()));
        let sink = confirmed.clone();
        nav.register_region(
            RegionSpec::new("list", GridShape::new([3, 0, 2])),
            move |at: Coord| {
                sink.lock().unwrap().push(at);
                ConfirmResponse::Handled
            },
        )
        .unwrap();
        nav.focus(&id("list"), start).unwrap();

        let out = nav.handle_direction(Direction::Down, start);
        assert_eq!(
            out,
            NavOutcome::Moved {
                region: id("list"),
                from: Coord::new(0, 0),
                to: Coord::new(2, 0)
            }
        );
        nav.handle_confirm(later(start));
        assert_eq!(*confirmed.lock().unwrap(), vec![Coord::new(2, 0)]);
    }
}
