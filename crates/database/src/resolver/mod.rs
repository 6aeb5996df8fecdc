//! Resolvers: per-type strategies for reading, writing and deleting objects.
//!
//! A type is usable with the typed operations once a [`TypeMapping`] binds
//! one resolver of each kind to it. The `Default*` resolvers cover the usual
//! case and are built from closures.
//!
//! [`TypeMapping`]: crate::TypeMapping

mod delete;
mod get;
mod put;

pub use delete::DefaultDeleteResolver;
pub use get::DefaultGetResolver;
pub use put::DefaultPutResolver;

use crate::results::{DeleteResult, PutResult};
use ripple_core::descriptor::{Query, RawQuery};
use ripple_core::{Result, Row, RowSet};
use ripple_storage::Store;

/// Converts rows into objects of type `T`.
pub trait GetResolver<T>: Send + Sync {
    /// Maps one row to an object.
    fn map_from_row(&self, row: &Row) -> Result<T>;

    /// Runs a structured read.
    fn perform_get(&self, store: &dyn Store, query: &Query) -> Result<RowSet> {
        store.query(query)
    }

    /// Runs a raw read.
    fn perform_raw_get(&self, store: &dyn Store, query: &RawQuery) -> Result<RowSet> {
        store.raw_query(query)
    }
}

/// Writes objects of type `T`, deciding between insert and update.
pub trait PutResolver<T>: Send + Sync {
    /// Inserts or updates `object`.
    fn perform_put(&self, store: &dyn Store, object: &T) -> Result<PutResult>;
}

/// Deletes objects of type `T`.
pub trait DeleteResolver<T>: Send + Sync {
    /// Deletes the rows backing `object`.
    fn perform_delete(&self, store: &dyn Store, object: &T) -> Result<DeleteResult>;
}
