//! Device classification and normalization into canonical actions.
//!
//! ```text
//! device id ──► family::classify ──► DeviceFamily
//!                                        │
//! RemapStore (custom overrides) ──► Normalizer::resolve ──► ResolvedLayout
//!                                                              │
//! raw axis value ──► axis::Deadzone ───────────────────────────┴─► canonical state
//! ```

pub mod action;
pub mod axis;
pub mod custom;
pub mod error;
pub mod family;
pub mod normalizer;

pub use action::{AxisBinding, AxisSign, CanonicalAction, CanonicalAxis, FamilyLayout};
pub use axis::{apply_deadzone, Deadzone};
pub use custom::{CustomMapping, RemapStore};
pub use error::MappingError;
pub use family::{classify, DeviceFamily};
pub use normalizer::{Normalizer, ResolvedLayout};
