//! Controller subsystem for gamepad input handling
//!
//! Implements the per-frame input pipeline:
//!
//! 1. [`event_collector`] - Raw device snapshots from the host (gilrs)
//! 2. [`event_processor`] - Classification, normalization and press edges
//! 3. [`poller`] - Frame-paced poll task with a start/stop lifecycle
//! 4. [`controller_handle`] - Unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► InputSource ──► DeviceTracker ──► TickSnapshot ──► listeners
//!             (Raw State)     (Canonical)        (per tick)
//! ```
//!
//! One tokio task drives the loop; each tick runs to completion under the
//! tracker lock before the next one is scheduled.

pub mod controller_handle;
pub mod device;
pub mod event_collector;
pub mod event_processor;
pub mod listeners;
pub mod poller;

pub use controller_handle::{ControllerError, ControllerHandle};
pub use device::{ButtonState, ConnectionEvent, Device, RawButton, RawDeviceState, TickSnapshot};
pub use event_collector::{GilrsSource, InputSource, ScriptedSource};
pub use event_processor::DeviceTracker;
pub use listeners::{ListenerRegistry, Subscription};
pub use poller::{DevicePoller, PollerError};
