//! Controller Handle - one object owning the whole input pipeline
//!
//! `init` wires the pieces together and starts polling; `shutdown` stops the
//! poll task and detaches the navigation listener. Everything a host needs
//! after startup (navigation, remaps, settings) is reached through the handle.
//!

use super::device::ConnectionEvent;
use super::event_collector::{GilrsSource, InputSource};
use super::event_processor::DeviceTracker;
use super::listeners::{lock_unpoisoned, ListenerRegistry, Subscription};
use super::poller::{DevicePoller, PollerError, Running};
use crate::config::NavSettings;
use crate::mapping::{CustomMapping, Deadzone, MappingError, Normalizer, RemapStore};
use crate::navigation::{NavError, NavOutcome, NavigationDriver};
use crate::persistence::{ConfigStore, StoreError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Errors that can occur during controller initialization or operation
///
/// Aggregates the subsystem errors so hosts can use a single `?`.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Poller error: {0}")]
    Poller(#[from] PollerError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavError),
}

/// Handle for managing the complete controller subsystem lifecycle
pub struct ControllerHandle {
    store: Arc<dyn ConfigStore>,
    settings: NavSettings,
    remaps: Arc<RemapStore>,
    tracker: Arc<Mutex<DeviceTracker>>,
    navigation: Arc<Mutex<NavigationDriver>>,
    outcomes: Arc<ListenerRegistry<NavOutcome>>,
    tick_subscription: Option<Subscription>,
    poller: Option<DevicePoller<Running>>,
}

impl ControllerHandle {
    /// Loads settings, builds the pipeline and starts polling `source`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn init(
        store: Arc<dyn ConfigStore>,
        source: Box<dyn InputSource>,
    ) -> Result<Self, ControllerError> {
        info!("Initializing controller subsystem");
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(PollerError::InitializationError(
                "no tokio runtime available".to_string(),
            )
            .into());
        }

        let settings = NavSettings::load(store.as_ref());
        debug!("Using settings: {:?}", settings);

        let remaps = Arc::new(RemapStore::new(store.clone()));
        let tracker = Arc::new(Mutex::new(DeviceTracker::new(
            Normalizer::new(remaps.clone()),
            Deadzone::new(settings.deadzone),
        )));
        let navigation = Arc::new(Mutex::new(NavigationDriver::from_settings(&settings)));
        let outcomes = Arc::new(ListenerRegistry::new());

        let tick_subscription = {
            let navigation = navigation.clone();
            let outcomes = outcomes.clone();
            lock_unpoisoned(&tracker).subscribe_ticks(move |snapshot| {
                let results = lock_unpoisoned(&navigation).on_tick(snapshot);
                for outcome in &results {
                    outcomes.notify(outcome);
                }
            })
        };

        let poller =
            DevicePoller::create(tracker.clone(), source, settings.frame_interval()).start();
        info!("Controller subsystem running");

        Ok(Self {
            store,
            settings,
            remaps,
            tracker,
            navigation,
            outcomes,
            tick_subscription: Some(tick_subscription),
            poller: Some(poller),
        })
    }

    /// [`init`](Self::init) over real hardware through gilrs
    pub fn init_with_gilrs(store: Arc<dyn ConfigStore>) -> Result<Self, ControllerError> {
        let source = GilrsSource::new()?;
        Self::init(store, Box::new(source))
    }

    /// Locks the navigation driver. Do not lock the tracker while holding it.
    pub fn navigation(&self) -> MutexGuard<'_, NavigationDriver> {
        lock_unpoisoned(&self.navigation)
    }

    pub fn tracker(&self) -> &Arc<Mutex<DeviceTracker>> {
        &self.tracker
    }

    pub fn remaps(&self) -> &Arc<RemapStore> {
        &self.remaps
    }

    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Called with every navigation outcome, on the poll task
    pub fn subscribe_outcomes<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&NavOutcome) + Send + 'static,
    {
        self.outcomes.subscribe(listener)
    }

    pub fn subscribe_connections<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&ConnectionEvent) + Send + 'static,
    {
        lock_unpoisoned(&self.tracker).subscribe_connections(listener)
    }

    /// Applies the deadzone from the next tick on and persists it
    pub fn set_deadzone(&mut self, value: f32) -> Result<(), ControllerError> {
        let deadzone = Deadzone::new(value);
        lock_unpoisoned(&self.tracker).set_deadzone(deadzone);
        self.settings.deadzone = deadzone.value();
        self.settings.save(self.store.as_ref())?;
        Ok(())
    }

    pub fn set_repeat_timing(
        &mut self,
        delay: Duration,
        interval: Duration,
    ) -> Result<(), ControllerError> {
        self.settings.repeat_delay_ms = delay.as_millis() as u64;
        self.settings.repeat_interval_ms = interval.as_millis() as u64;
        self.settings = self.settings.clone().sanitized();
        lock_unpoisoned(&self.navigation)
            .set_timing(self.settings.repeat_delay(), self.settings.repeat_interval());
        self.settings.save(self.store.as_ref())?;
        Ok(())
    }

    /// Replaces the whole custom mapping of one device
    pub fn set_custom_mapping(
        &self,
        device_id: &str,
        mapping: CustomMapping,
    ) -> Result<(), ControllerError> {
        self.remaps.set(device_id, mapping)?;
        Ok(())
    }

    /// Stops polling; no tick runs after this returns
    pub async fn shutdown(mut self) {
        info!("Shutting down controller subsystem");
        if let Some(subscription) = self.tick_subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
        info!("Controller subsystem stopped");
    }
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .finish()
    }
}
