//! Subscription handles and cancellation.
//!
//! A `Subscription` is what callers keep after subscribing to the change bus
//! or to a live query. Unsubscribing flips the shared `CancellationToken`
//! first, so work already scheduled sees the flag before it emits, and then
//! releases the registration.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Cooperative cancellation flag shared between a subscription handle and
/// the work it guards.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token cancelled. Idempotent.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once `cancel` has been called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

type Release = Box<dyn FnOnce() + Send>;

/// A handle to an active registration.
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`]
/// to stop deliveries.
pub struct Subscription {
    /// Unique identifier
    id: SubscriptionId,
    /// Shared with the registration
    token: CancellationToken,
    /// Runs once, on the first unsubscribe
    release: Mutex<Option<Release>>,
}

impl Subscription {
    /// Creates a handle that runs `release` on the first unsubscribe.
    pub fn new<F>(id: SubscriptionId, token: CancellationToken, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            token,
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Returns the subscription ID.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns whether this subscription is still active.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Returns the cancellation token guarding this subscription.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stops all future deliveries. Calling it more than once is a no-op.
    pub fn unsubscribe(&self) {
        self.token.cancel();
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
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
