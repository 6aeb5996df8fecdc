//! Database - Main entry point for Ripple operations.
//!
//! `Database` ties together a [`Store`], the type mapping registry and the
//! change bus. Every write goes through one re-entrant write lock; the tables
//! it changed are published on the bus after the lock is released, or, inside
//! a transaction, collected and published once when the outermost level
//! commits.

use crate::config::DatabaseConfig;
use crate::operations::{
    PreparedDeleteBuilder, PreparedExecuteSqlBuilder, PreparedGetBuilder, PreparedPutBuilder,
};
use crate::registry::TypeMappingRegistry;
use crate::type_mapping::TypeMapping;
use log::{debug, warn};
use parking_lot::ReentrantMutex;
use ripple_core::{Error, Result, TableSet};
use ripple_reactive::{ChangeBus, Changes, SchedulerConfig, Subscription};
use ripple_storage::{Store, Transaction};
use std::cell::RefCell;
use std::sync::{Arc, Weak};

/// Pending changes, one set per open transaction level.
type PendingLevels = RefCell<Vec<TableSet>>;

struct DatabaseInner {
    store: Box<dyn Store>,
    registry: TypeMappingRegistry,
    bus: ChangeBus,
    config: DatabaseConfig,
    write_lock: ReentrantMutex<PendingLevels>,
}

/// A reactive handle over one store.
///
/// Cheap to clone; clones share the store, registry and change bus.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// A non-owning reference used by live queries, so that an open stream does
/// not keep the database alive.
#[derive(Clone)]
pub(crate) struct WeakDatabase(Weak<DatabaseInner>);

impl WeakDatabase {
    pub(crate) fn upgrade(&self) -> Result<Database> {
        self.0
            .upgrade()
            .map(|inner| Database { inner })
            .ok_or_else(|| Error::query_execution("Database has been closed"))
    }
}

/// Opens one transaction level; dropping it unclosed discards its changes.
struct Level<'a> {
    levels: &'a PendingLevels,
    open: bool,
}

impl<'a> Level<'a> {
    fn push(levels: &'a PendingLevels) -> Self {
        levels.borrow_mut().push(TableSet::new());
        Self { levels, open: true }
    }

    fn close(mut self) -> TableSet {
        self.open = false;
        self.levels.borrow_mut().pop().unwrap_or_default()
    }
}

impl Drop for Level<'_> {
    fn drop(&mut self) {
        if self.open {
            self.levels.borrow_mut().pop();
        }
    }
}

impl Database {
    /// Creates a builder.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Starts a read.
    pub fn get(&self) -> PreparedGetBuilder {
        PreparedGetBuilder::new(self.clone())
    }

    /// Starts an insert-or-update.
    pub fn put(&self) -> PreparedPutBuilder {
        PreparedPutBuilder::new(self.clone())
    }

    /// Starts a delete.
    pub fn delete(&self) -> PreparedDeleteBuilder {
        PreparedDeleteBuilder::new(self.clone())
    }

    /// Starts a raw statement.
    pub fn execute_sql(&self) -> PreparedExecuteSqlBuilder {
        PreparedExecuteSqlBuilder::new(self.clone())
    }

    /// Runs `f` in a store transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and rolls back otherwise.
    /// Calls nest; inner levels are savepoints. Changes made inside are
    /// published once, after the outermost level commits. A rolled back
    /// level publishes nothing.
    pub fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Database) -> Result<R>,
    {
        let guard = self.inner.write_lock.lock();
        let level = Level::push(&guard);
        let tx = Transaction::begin(self.inner.store.as_ref())?;

        let value = match f(self) {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("rollback after failed transaction body: {}", rollback);
                }
                return Err(err);
            }
        };
        tx.commit()?;

        let changes = level.close();
        let outermost = match guard.borrow_mut().last_mut() {
            Some(parent) => {
                parent.extend(changes);
                None
            }
            None => Some(changes),
        };
        drop(guard);

        if let Some(changes) = outermost {
            self.publish(changes);
        }
        Ok(value)
    }

    /// Subscribes `callback` to changes touching any of `tables`.
    pub fn observe_changes_in_tables<F>(&self, tables: TableSet, callback: F) -> Subscription
    where
        F: Fn(&Changes) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(tables, callback)
    }

    /// Publishes changes made outside Ripple, e.g. by another connection.
    ///
    /// Inside a transaction the changes are deferred like any other write.
    pub fn notify_about_changes(&self, changes: Changes) {
        let guard = self.inner.write_lock.lock();
        if let Some(level) = guard.borrow_mut().last_mut() {
            level.extend(changes.tables().iter().cloned());
            return;
        }
        drop(guard);
        self.inner.bus.publish(changes);
    }

    /// Registers the mapping for `T`, replacing any earlier one.
    pub fn register_type_mapping<T: 'static>(&self, mapping: TypeMapping<T>) {
        self.inner.registry.register(mapping);
    }

    /// Declares `P` as a supertype of `S`. See
    /// [`TypeMappingRegistry::declare_supertype`].
    pub fn declare_supertype<S, P, U, N>(&self, upcast: U, narrow: N)
    where
        S: 'static,
        P: 'static,
        U: Fn(&S) -> P + Send + Sync + 'static,
        N: Fn(P) -> S + Send + Sync + 'static,
    {
        self.inner.registry.declare_supertype(upcast, narrow);
    }

    /// Resolves the mapping for `T`.
    pub fn type_mapping<T: 'static>(&self) -> Result<TypeMapping<T>> {
        self.inner.registry.resolve::<T>()
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Returns the change bus.
    pub fn change_bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Returns the configuration the database was built with.
    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    pub(crate) fn downgrade(&self) -> WeakDatabase {
        WeakDatabase(Arc::downgrade(&self.inner))
    }

    /// Runs `op` under the write lock.
    ///
    /// `op` records the tables it changed in the set it is given. They are
    /// published once `op` returns, even if it fails part way, or deferred to
    /// the enclosing transaction.
    pub(crate) fn write<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&dyn Store, &mut TableSet) -> Result<R>,
    {
        let mut touched = TableSet::new();
        let result = {
            let guard = self.inner.write_lock.lock();
            let result = op(self.inner.store.as_ref(), &mut touched);
            if let Some(level) = guard.borrow_mut().last_mut() {
                level.extend(touched.drain());
            }
            result
        };
        self.publish(touched);
        result
    }

    fn publish(&self, tables: TableSet) {
        if tables.is_empty() {
            return;
        }
        self.inner.bus.publish(Changes::new(tables));
    }
}

/// Builder for [`Database`].
#[derive(Default)]
pub struct DatabaseBuilder {
    store: Option<Box<dyn Store>>,
    config: DatabaseConfig,
    registry: TypeMappingRegistry,
}

impl DatabaseBuilder {
    /// Sets the store. Required.
    pub fn store(mut self, store: impl Store + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: DatabaseConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where change deliveries run.
    pub fn scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.config.scheduler = scheduler;
        self
    }

    /// Sets the worker thread name prefix.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Registers a type mapping.
    pub fn add_type_mapping<T: 'static>(self, mapping: TypeMapping<T>) -> Self {
        self.registry.register(mapping);
        self
    }

    /// Declares `P` as a supertype of `S`.
    pub fn declare_supertype<S, P, U, N>(self, upcast: U, narrow: N) -> Self
    where
        S: 'static,
        P: 'static,
        U: Fn(&S) -> P + Send + Sync + 'static,
        N: Fn(P) -> S + Send + Sync + 'static,
    {
        self.registry.declare_supertype(upcast, narrow);
        self
    }

    /// Builds the database.
    pub fn build(self) -> Result<Database> {
        let store = self
            .store
            .ok_or_else(|| Error::illegal_argument("Please specify store"))?;
        let bus = ChangeBus::with_config(&self.config.scheduler, &self.config.thread_name_prefix);
        debug!("database opened with {:?} scheduler", self.config.scheduler);

        Ok(Database {
            inner: Arc::new(DatabaseInner {
                store,
                registry: self.registry,
                bus,
                config: self.config,
                write_lock: ReentrantMutex::new(RefCell::new(Vec::new())),
            }),
        })
    }
}
