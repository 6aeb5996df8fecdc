//! Prepared reads.
//!
//! ```text
//! db.get()
//!   .list_of_objects::<User>()      // or object / row_set / number_of_results
//!   .with_query(query)              // or with_raw_query
//!   .prepare()?
//!   .execute_blocking()             // or observe()
//! ```

use crate::database::{Database, WeakDatabase};
use crate::resolver::GetResolver;
use ripple_core::descriptor::{Query, RawQuery};
use ripple_core::{Error, Result, RowSet, TableSet};
use ripple_reactive::LiveQuery;
use ripple_storage::Store;
use std::sync::Arc;

/// What a prepared read runs.
#[derive(Clone, Debug)]
pub enum GetSource {
    Query(Query),
    Raw(RawQuery),
}

impl GetSource {
    /// Tables a live read re-executes on. A raw query observes only the
    /// tables it declares.
    pub fn observed_tables(&self) -> TableSet {
        match self {
            GetSource::Query(query) => query.observed_tables(),
            GetSource::Raw(raw) => raw.observes_tables().clone(),
        }
    }

    fn rows(&self, store: &dyn Store) -> Result<RowSet> {
        match self {
            GetSource::Query(query) => store.query(query),
            GetSource::Raw(raw) => store.raw_query(raw),
        }
    }

    fn rows_with<T>(&self, store: &dyn Store, resolver: &dyn GetResolver<T>) -> Result<RowSet> {
        match self {
            GetSource::Query(query) => resolver.perform_get(store, query),
            GetSource::Raw(raw) => resolver.perform_raw_get(store, raw),
        }
    }
}

fn require_source(source: Option<GetSource>) -> Result<GetSource> {
    source.ok_or_else(|| Error::illegal_argument("Please specify query"))
}

fn live<R, F>(db: &Database, observed: TableSet, fetch: F) -> LiveQuery<R>
where
    R: Send + 'static,
    F: Fn(&Database) -> Result<R> + Send + Sync + 'static,
{
    let weak: WeakDatabase = db.downgrade();
    LiveQuery::new(db.change_bus().clone(), observed, move || fetch(&weak.upgrade()?))
}

/// Entry point returned by [`Database::get`].
pub struct PreparedGetBuilder {
    db: Database,
}

impl PreparedGetBuilder {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Reads every matching row as a `T`.
    pub fn list_of_objects<T>(self) -> GetListOfObjectsBuilder<T> {
        GetListOfObjectsBuilder {
            db: self.db,
            source: None,
            resolver: None,
        }
    }

    /// Reads the first matching row as a `T`.
    pub fn object<T>(self) -> GetObjectBuilder<T> {
        GetObjectBuilder {
            db: self.db,
            source: None,
            resolver: None,
        }
    }

    /// Reads the raw rows.
    pub fn row_set(self) -> GetRowSetBuilder {
        GetRowSetBuilder {
            db: self.db,
            source: None,
        }
    }

    /// Counts the matching rows.
    pub fn number_of_results(self) -> GetNumberOfResultsBuilder {
        GetNumberOfResultsBuilder {
            db: self.db,
            source: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

struct ObjectsGet<T> {
    source: GetSource,
    resolver: Option<Arc<dyn GetResolver<T>>>,
}

impl<T> Clone for ObjectsGet<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            resolver: self.resolver.clone(),
        }
    }
}

impl<T: 'static> ObjectsGet<T> {
    fn fetch(&self, db: &Database, first_only: bool) -> Result<Vec<T>> {
        let resolver = match &self.resolver {
            Some(resolver) => Arc::clone(resolver),
            None => Arc::clone(db.type_mapping::<T>()?.get_resolver()),
        };
        let rows = self.source.rows_with(db.store(), resolver.as_ref())?;
        let take = if first_only { 1 } else { rows.len() };
        rows.iter()
            .take(take)
            .map(|row| resolver.map_from_row(row))
            .collect()
    }
}

/// Builder for [`PreparedGetListOfObjects`].
pub struct GetListOfObjectsBuilder<T> {
    db: Database,
    source: Option<GetSource>,
    resolver: Option<Arc<dyn GetResolver<T>>>,
}

impl<T: 'static> GetListOfObjectsBuilder<T> {
    /// Reads with a structured query.
    pub fn with_query(mut self, query: Query) -> Self {
        self.source = Some(GetSource::Query(query));
        self
    }

    /// Reads with a raw query.
    pub fn with_raw_query(mut self, query: RawQuery) -> Self {
        self.source = Some(GetSource::Raw(query));
        self
    }

    /// Uses `resolver` instead of the registered type mapping.
    pub fn with_get_resolver(mut self, resolver: impl GetResolver<T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Fails with `IllegalArgument` if no query was given.
    pub fn prepare(self) -> Result<PreparedGetListOfObjects<T>> {
        Ok(PreparedGetListOfObjects {
            db: self.db,
            get: ObjectsGet {
                source: require_source(self.source)?,
                resolver: self.resolver,
            },
        })
    }
}

/// A read producing `Vec<T>`.
pub struct PreparedGetListOfObjects<T> {
    db: Database,
    get: ObjectsGet<T>,
}

impl<T: Send + 'static> PreparedGetListOfObjects<T> {
    /// Runs the read on the calling thread.
    pub fn execute_blocking(&self) -> Result<Vec<T>> {
        self.get.fetch(&self.db, false)
    }

    /// Returns a live query re-running the read on every relevant change.
    pub fn observe(&self) -> LiveQuery<Vec<T>> {
        let get = self.get.clone();
        live(&self.db, get.source.observed_tables(), move |db| get.fetch(db, false))
    }
}

/// Builder for [`PreparedGetObject`].
pub struct GetObjectBuilder<T> {
    db: Database,
    source: Option<GetSource>,
    resolver: Option<Arc<dyn GetResolver<T>>>,
}

impl<T: 'static> GetObjectBuilder<T> {
    /// Reads with a structured query.
    pub fn with_query(mut self, query: Query) -> Self {
        self.source = Some(GetSource::Query(query));
        self
    }

    /// Reads with a raw query.
    pub fn with_raw_query(mut self, query: RawQuery) -> Self {
        self.source = Some(GetSource::Raw(query));
        self
    }

    /// Uses `resolver` instead of the registered type mapping.
    pub fn with_get_resolver(mut self, resolver: impl GetResolver<T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Fails with `IllegalArgument` if no query was given.
    pub fn prepare(self) -> Result<PreparedGetObject<T>> {
        Ok(PreparedGetObject {
            db: self.db,
            get: ObjectsGet {
                source: require_source(self.source)?,
                resolver: self.resolver,
            },
        })
    }
}

/// A read producing the first matching object, if any.
pub struct PreparedGetObject<T> {
    db: Database,
    get: ObjectsGet<T>,
}

impl<T: Send + 'static> PreparedGetObject<T> {
    /// Runs the read on the calling thread.
    pub fn execute_blocking(&self) -> Result<Option<T>> {
        Ok(self.get.fetch(&self.db, true)?.into_iter().next())
    }

    /// Returns a live query re-running the read on every relevant change.
    pub fn observe(&self) -> LiveQuery<Option<T>> {
        let get = self.get.clone();
        live(&self.db, get.source.observed_tables(), move |db| {
            Ok(get.fetch(db, true)?.into_iter().next())
        })
    }
}

// ---------------------------------------------------------------------------
// Rows and counts
// ---------------------------------------------------------------------------

/// Builder for [`PreparedGetRowSet`].
pub struct GetRowSetBuilder {
    db: Database,
    source: Option<GetSource>,
}

impl GetRowSetBuilder {
    /// Reads with a structured query.
    pub fn with_query(mut self, query: Query) -> Self {
        self.source = Some(GetSource::Query(query));
        self
    }

    /// Reads with a raw query.
    pub fn with_raw_query(mut self, query: RawQuery) -> Self {
        self.source = Some(GetSource::Raw(query));
        self
    }

    /// Fails with `IllegalArgument` if no query was given.
    pub fn prepare(self) -> Result<PreparedGetRowSet> {
        Ok(PreparedGetRowSet {
            db: self.db,
            source: require_source(self.source)?,
        })
    }
}

/// A read producing the raw rows.
pub struct PreparedGetRowSet {
    db: Database,
    source: GetSource,
}

impl PreparedGetRowSet {
    /// Runs the read on the calling thread.
    pub fn execute_blocking(&self) -> Result<RowSet> {
        self.source.rows(self.db.store())
    }

    /// Returns a live query re-running the read on every relevant change.
    pub fn observe(&self) -> LiveQuery<RowSet> {
        let source = self.source.clone();
        live(&self.db, source.observed_tables(), move |db| source.rows(db.store()))
    }
}

/// Builder for [`PreparedGetNumberOfResults`].
pub struct GetNumberOfResultsBuilder {
    db: Database,
    source: Option<GetSource>,
}

impl GetNumberOfResultsBuilder {
    /// Counts with a structured query.
    pub fn with_query(mut self, query: Query) -> Self {
        self.source = Some(GetSource::Query(query));
        self
    }

    /// Counts the rows of a raw query.
    pub fn with_raw_query(mut self, query: RawQuery) -> Self {
        self.source = Some(GetSource::Raw(query));
        self
    }

    /// Fails with `IllegalArgument` if no query was given.
    pub fn prepare(self) -> Result<PreparedGetNumberOfResults> {
        Ok(PreparedGetNumberOfResults {
            db: self.db,
            source: require_source(self.source)?,
        })
    }
}

/// A read producing the number of matching rows.
pub struct PreparedGetNumberOfResults {
    db: Database,
    source: GetSource,
}

fn count(source: &GetSource, store: &dyn Store) -> Result<usize> {
    match source {
        GetSource::Query(query) => store.count(query),
        GetSource::Raw(raw) => Ok(store.raw_query(raw)?.len()),
    }
}

impl PreparedGetNumberOfResults {
    /// Runs the count on the calling thread.
    pub fn execute_blocking(&self) -> Result<usize> {
        count(&self.source, self.db.store())
    }

    /// Returns a live query re-counting on every relevant change.
    pub fn observe(&self) -> LiveQuery<usize> {
        let source = self.source.clone();
        live(&self.db, source.observed_tables(), move |db| count(&source, db.store()))
    }
}
