//! Listener registries with explicit unregister handles.
//!
//! Notification walks a copy of the listener list, but every entry carries a
//! shared `alive` flag that is checked right before the call. Unsubscribing
//! clears the flag first, so a listener removed by another listener halfway
//! through a notification round is skipped for the rest of that round.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};
use tracing::debug;

type Callback<T> = Box<dyn FnMut(&T) + Send>;

struct Entry<T> {
    id: u64,
    alive: Arc<AtomicBool>,
    callback: Arc<Mutex<Callback<T>>>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T: 'static> Detach for Mutex<Vec<Entry<T>>> {
    fn detach(&self, id: u64) {
        lock_unpoisoned(self).retain(|entry| entry.id != id);
    }
}

/// Locks a std mutex, recovering the data if a listener panicked while holding it
pub(crate) fn lock_unpoisoned<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ListenerRegistry<T> {
    entries: Arc<Mutex<Vec<Entry<T>>>>,
    next_id: AtomicU64,
}

impl<T: 'static> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let alive = Arc::new(AtomicBool::new(true));
        lock_unpoisoned(&self.entries).push(Entry {
            id,
            alive: alive.clone(),
            callback: Arc::new(Mutex::new(Box::new(callback))),
        });

        let registry: Weak<dyn Detach> = Arc::downgrade(&self.entries) as Weak<dyn Detach>;
        Subscription {
            id,
            alive,
            registry,
        }
    }

    /// Calls every live listener with `event`, returning how many ran.
    ///
    /// A listener that is already running (re-entrant notify from inside its
    /// own callback) is skipped for the nested round.
    pub fn notify(&self, event: &T) -> usize {
        let round: Vec<(Arc<AtomicBool>, Arc<Mutex<Callback<T>>>)> = lock_unpoisoned(&self.entries)
            .iter()
            .map(|entry| (entry.alive.clone(), entry.callback.clone()))
            .collect();

        let mut fired = 0;
        for (alive, callback) in round {
            if !alive.load(Ordering::Acquire) {
                continue;
            }
            let mut callback = match callback.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    debug!("Skipping re-entrant listener");
                    continue;
                }
            };
            // may have been unsubscribed while we waited on the lock
            if !alive.load(Ordering::Acquire) {
                continue;
            }
            let call: &mut Callback<T> = &mut callback;
            call(event);
            fired += 1;
        }
        fired
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &lock_unpoisoned(&self.entries).len())
            .finish()
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`].
///
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    alive: Arc<AtomicBool>,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Removes the listener. It will not fire again, even if a notification
    /// round is in progress right now.
    pub fn unsubscribe(self) {
        self.alive.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::Acquire) && self.registry.strong_count() > 0
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
