//! Frame-paced poll loop with a statum lifecycle.
//!
//! ```text
//! DevicePoller<Stopped> ──start()──► DevicePoller<Running>
//!          ▲                                 │
//!          └──────────── stop().await ◄──────┘
//! ```
//!
//! The loop reschedules after each tick completes: it sleeps for whatever is
//! left of the frame interval, never a fixed-period timer, so a slow tick
//! cannot queue up a burst of catch-up ticks.

use super::device::TickSnapshot;
use super::event_collector::InputSource;
use super::event_processor::DeviceTracker;
use super::listeners::lock_unpoisoned;
use statum::{machine, state};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Failed to initialize input source: {0}")]
    InitializationError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum PollerState {
    Stopped,
    Running,
}

#[machine]
pub struct DevicePoller<S: PollerState> {
    tracker: Arc<Mutex<DeviceTracker>>,
    source: Arc<Mutex<Box<dyn InputSource>>>,
    frame_interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl<S: PollerState> DevicePoller<S> {
    pub fn tracker(&self) -> &Arc<Mutex<DeviceTracker>> {
        &self.tracker
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

/// One tick: read the source, then process while holding the tracker lock
fn tick(
    tracker: &Mutex<DeviceTracker>,
    source: &Mutex<Box<dyn InputSource>>,
    now: Instant,
) -> TickSnapshot {
    let raw = lock_unpoisoned(source).snapshot();
    lock_unpoisoned(tracker).process(raw, now)
}

impl DevicePoller<Stopped> {
    pub fn create(
        tracker: Arc<Mutex<DeviceTracker>>,
        source: Box<dyn InputSource>,
        frame_interval: Duration,
    ) -> Self {
        debug!("Creating device poller, frame interval {:?}", frame_interval);
        Self::new(
            tracker,
            Arc::new(Mutex::new(source)),
            frame_interval,
            None, // task
        )
    }

    /// Runs a single tick on the caller's thread
    pub fn poll_once(&self) -> TickSnapshot {
        tick(&self.tracker, &self.source, Instant::now())
    }

    pub fn start(mut self) -> DevicePoller<Running> {
        info!("Starting device poller");
        let tracker = self.tracker.clone();
        let source = self.source.clone();
        let frame = self.frame_interval;

        self.task = Some(tokio::spawn(async move {
            loop {
                let started = Instant::now();
                tick(&tracker, &source, started);
                tokio::time::sleep(frame.saturating_sub(started.elapsed())).await;
            }
        }));

        self.transition()
    }
}

impl DevicePoller<Running> {
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Aborts the scheduled continuation and waits for it to wind down.
    ///
    /// Once this returns no further tick will run.
    pub async fn stop(mut self) -> DevicePoller<Stopped> {
        info!("Stopping device poller");
        if let Some(task) = self.task.take() {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => debug!("Poll task cancelled"),
                Err(e) => warn!("Poll task ended abnormally: {}", e),
            }
        }
        self.transition()
    }
}
