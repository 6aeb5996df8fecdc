//! Change bus and notification routing.
//!
//! `ChangeBus` routes "tables changed" notifications to the subscribers whose
//! observed tables intersect the changed set.
//!
//! Each subscriber has at most one delivery running and at most one pending.
//! A notification that arrives while a delivery runs is merged into the
//! pending one, so a burst of N writes during a slow re-query produces a
//! single follow-up delivery.
//!
//! ```text
//!   publish(Changes{users})
//!        │
//!        ├─► slot 1 (observes users)   idle    → schedule delivery
//!        ├─► slot 2 (observes users)   running → merge into pending
//!        └─x slot 3 (observes tweets)  skipped
//! ```

use crate::changes::Changes;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::subscription::{CancellationToken, Subscription, SubscriptionId};
use hashbrown::HashMap;
use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};
use ripple_core::{Error, TableSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked with the changed tables.
pub type ChangeCallback = Arc<dyn Fn(&Changes) + Send + Sync>;

/// Callback invoked once when a subscriber's change callback panics.
pub type ErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;

#[derive(Default)]
struct DeliveryState {
    running: bool,
    pending: Option<Changes>,
}

struct Slot {
    id: SubscriptionId,
    observed: TableSet,
    callback: ChangeCallback,
    on_panic: Option<ErrorCallback>,
    token: CancellationToken,
    delivery: Mutex<DeliveryState>,
}

impl Slot {
    fn idle(&self) {
        let mut state = self.delivery.lock();
        state.running = false;
        state.pending = None;
    }
}

struct BusInner {
    slots: RwLock<HashMap<SubscriptionId, Arc<Slot>>>,
    next_id: AtomicU64,
    scheduler: Scheduler,
}

impl BusInner {
    fn remove(&self, id: SubscriptionId) -> bool {
        match self.slots.write().remove(&id) {
            Some(slot) => {
                slot.token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Multicast channel for table change notifications.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// Creates a bus that delivers through `scheduler`.
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            inner: Arc::new(BusInner {
                slots: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                scheduler,
            }),
        }
    }

    /// Creates a bus that delivers on the publishing thread.
    pub fn immediate() -> Self {
        Self::new(Scheduler::Immediate)
    }

    /// Creates a bus from a scheduler configuration.
    pub fn with_config(config: &SchedulerConfig, thread_name_prefix: &str) -> Self {
        Self::new(Scheduler::from_config(config, thread_name_prefix))
    }

    /// Subscribes `callback` to changes touching any of `observed`.
    pub fn subscribe<F>(&self, observed: TableSet, callback: F) -> Subscription
    where
        F: Fn(&Changes) + Send + Sync + 'static,
    {
        self.register(observed, Arc::new(callback), None)
    }

    /// Like [`subscribe`](Self::subscribe), but `on_panic` receives a
    /// `CallbackPanicked` error if `callback` ever panics. The subscriber is
    /// removed in that case.
    pub fn subscribe_with_error<F, E>(
        &self,
        observed: TableSet,
        callback: F,
        on_panic: E,
    ) -> Subscription
    where
        F: Fn(&Changes) + Send + Sync + 'static,
        E: Fn(Error) + Send + Sync + 'static,
    {
        self.register(observed, Arc::new(callback), Some(Arc::new(on_panic)))
    }

    fn register(
        &self,
        observed: TableSet,
        callback: ChangeCallback,
        on_panic: Option<ErrorCallback>,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        trace!("subscriber {} observes {} tables", id, observed.len());

        let slot = Arc::new(Slot {
            id,
            observed,
            callback,
            on_panic,
            token: token.clone(),
            delivery: Mutex::new(DeliveryState::default()),
        });
        self.inner.slots.write().insert(id, slot);

        let bus = Arc::downgrade(&self.inner);
        Subscription::new(id, token, move || {
            if let Some(bus) = bus.upgrade() {
                bus.remove(id);
            }
        })
    }

    /// Removes a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    /// Notifies every subscriber whose observed tables intersect `changes`.
    ///
    /// Returns the number of subscribers notified. Publishing an empty set
    /// is a no-op.
    pub fn publish(&self, changes: Changes) -> usize {
        if changes.is_empty() {
            return 0;
        }

        let targets: Vec<Arc<Slot>> = {
            let slots = self.inner.slots.read();
            slots
                .values()
                .filter(|slot| !slot.token.is_cancelled() && changes.intersects(&slot.observed))
                .cloned()
                .collect()
        };
        debug!("publish {} to {} subscribers", changes, targets.len());

        for slot in &targets {
            self.schedule(Arc::clone(slot), changes.clone());
        }
        targets.len()
    }

    fn schedule(&self, slot: Arc<Slot>, changes: Changes) {
        {
            let mut state = slot.delivery.lock();
            if state.running {
                match state.pending.as_mut() {
                    Some(pending) => pending.merge(&changes),
                    None => state.pending = Some(changes),
                }
                trace!("subscriber {} busy, delivery coalesced", slot.id);
                return;
            }
            state.running = true;
        }

        let bus = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .spawn(Box::new(move || deliver(bus, slot, changes)));
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.slots.read().len()
    }

    /// Returns the number of subscribers observing `table`.
    pub fn subscribers_for_table(&self, table: &str) -> usize {
        self.inner
            .slots
            .read()
            .values()
            .filter(|slot| slot.observed.contains(table))
            .count()
    }

    /// Returns true if there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.inner.slots.read().is_empty()
    }

    /// Cancels and removes every subscriber.
    pub fn clear(&self) {
        let drained: Vec<Arc<Slot>> = self.inner.slots.write().drain().map(|(_, s)| s).collect();
        for slot in drained {
            slot.token.cancel();
        }
    }
}

/// Runs deliveries for one subscriber until nothing is pending.
fn deliver(bus: Weak<BusInner>, slot: Arc<Slot>, mut changes: Changes) {
    loop {
        if slot.token.is_cancelled() {
            slot.idle();
            return;
        }

        trace!("deliver {} to subscriber {}", changes, slot.id);
        let outcome = catch_unwind(AssertUnwindSafe(|| (slot.callback)(&changes)));
        if let Err(payload) = outcome {
            let err = Error::callback_panicked(&*payload);
            warn!("subscriber {} removed: {}", slot.id, err);
            slot.token.cancel();
            slot.idle();
            if let Some(bus) = bus.upgrade() {
                bus.remove(slot.id);
            }
            if let Some(on_panic) = &slot.on_panic {
                if catch_unwind(AssertUnwindSafe(|| on_panic(err))).is_err() {
                    warn!("error callback of subscriber {} panicked", slot.id);
                }
            }
            return;
        }

        changes = {
            let mut state = slot.delivery.lock();
            match state.pending.take() {
                Some(next) => next,
                None => {
                    state.running = false;
                    return;
                }
            }
        };
    }
}
