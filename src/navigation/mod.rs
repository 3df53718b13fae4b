//! Directional navigation and focus routing.
//!
//! ```text
//! TickSnapshot ──► direction::resolve_direction ──► repeat::RepeatTimer ─┐
//!        │                                                               ▼
//!        └──── confirm / back edges ─────────────► controller::NavigationController
//!                                                       │
//!                                         active region's RegionHandler
//! ```

pub mod controller;
pub mod direction;
pub mod driver;
pub mod region;
pub mod repeat;
pub mod scroll;

pub use controller::{DropReason, NavError, NavOutcome, NavSignal, NavigationController};
pub use direction::{resolve_direction, Direction};
pub use driver::NavigationDriver;
pub use region::{
    BackResponse, ConfirmResponse, Coord, EdgePolicy, GridShape, Overlay, RegionHandler, RegionId,
    RegionSpec,
};
pub use repeat::RepeatTimer;
pub use scroll::{lookahead_offset, ScrollRequest, LOOKAHEAD_ANCHOR};
