//! Transaction management for Ripple stores.
//!
//! A `Transaction` opens one level of a store transaction and guarantees it
//! is closed exactly once: explicitly through `commit`/`rollback`, or by
//! rolling back when the guard is dropped while still active.

use crate::store::Store;
use log::{debug, warn};
use ripple_core::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global transaction ID counter.
static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

/// Transaction ID type.
pub type TransactionId = u64;

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// One open level of a store transaction.
pub struct Transaction<'a> {
    /// Unique transaction ID.
    id: TransactionId,
    /// The store the transaction was opened on.
    store: &'a dyn Store,
    /// Current state.
    state: TransactionState,
}

impl<'a> Transaction<'a> {
    /// Begins a transaction (or savepoint) on `store`.
    pub fn begin(store: &'a dyn Store) -> Result<Self> {
        store.begin_transaction()?;
        let id = NEXT_TX_ID.fetch_add(1, Ordering::SeqCst);
        debug!("transaction {} started", id);
        Ok(Self {
            id,
            store,
            state: TransactionState::Active,
        })
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Checks if the transaction is active, returns error if not.
    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::illegal_argument("Transaction is not active"));
        }
        Ok(())
    }

    /// Commits the transaction.
    ///
    /// If the store refuses the commit the level is rolled back before the
    /// error is returned.
    pub fn commit(mut self) -> Result<()> {
        self.check_active()?;
        match self.store.commit_transaction() {
            Ok(()) => {
                self.state = TransactionState::Committed;
                debug!("transaction {} committed", self.id);
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::RolledBack;
                if let Err(rollback) = self.store.rollback_transaction() {
                    warn!("transaction {} rollback after failed commit: {}", self.id, rollback);
                }
                Err(e)
            }
        }
    }

    /// Rolls back the transaction.
    pub fn rollback(mut self) -> Result<()> {
        self.check_active()?;
        self.state = TransactionState::RolledBack;
        debug!("transaction {} rolled back", self.id);
        self.store.rollback_transaction()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            self.state = TransactionState::RolledBack;
            debug!("transaction {} dropped while active, rolling back", self.id);
            if let Err(e) = self.store.rollback_transaction() {
                warn!("transaction {} rollback on drop failed: {}", self.id, e);
            }
        }
    }
}
