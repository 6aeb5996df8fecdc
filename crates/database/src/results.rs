//! Outcomes of put and delete operations.

use ripple_core::TableSet;

/// Result of putting one object: either an insert or an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutResult {
    inserted_id: Option<i64>,
    rows_updated: usize,
    affected_tables: TableSet,
}

impl PutResult {
    /// Creates the result of an insert.
    pub fn new_insert_result<I, S>(inserted_id: i64, affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inserted_id: Some(inserted_id),
            rows_updated: 0,
            affected_tables: ripple_core::table_set(affected_tables),
        }
    }

    /// Creates the result of an update.
    pub fn new_update_result<I, S>(rows_updated: usize, affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inserted_id: None,
            rows_updated,
            affected_tables: ripple_core::table_set(affected_tables),
        }
    }

    /// Returns true if the object was inserted.
    pub fn was_inserted(&self) -> bool {
        self.inserted_id.is_some()
    }

    /// Returns true if at least one row was updated.
    pub fn was_updated(&self) -> bool {
        self.rows_updated > 0
    }

    /// Returns the generated key of an insert.
    pub fn inserted_id(&self) -> Option<i64> {
        self.inserted_id
    }

    /// Returns the number of rows an update touched.
    pub fn rows_updated(&self) -> usize {
        self.rows_updated
    }

    /// Returns the tables the put wrote to.
    pub fn affected_tables(&self) -> &TableSet {
        &self.affected_tables
    }

    /// Tables to notify about; empty when nothing was written.
    pub(crate) fn changed_tables(&self) -> impl Iterator<Item = &String> {
        let changed = self.was_inserted() || self.was_updated();
        self.affected_tables.iter().filter(move |_| changed)
    }
}

/// Results of putting a collection, in input order.
#[derive(Clone, Debug)]
pub struct PutResults<T> {
    results: Vec<(T, PutResult)>,
}

impl<T> PutResults<T> {
    pub(crate) fn new(results: Vec<(T, PutResult)>) -> Self {
        Self { results }
    }

    /// Returns each object paired with its result.
    pub fn results(&self) -> &[(T, PutResult)] {
        &self.results
    }

    /// Consumes the results, returning the pairs.
    pub fn into_results(self) -> Vec<(T, PutResult)> {
        self.results
    }

    /// Number of objects that were inserted.
    pub fn number_of_inserts(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.was_inserted()).count()
    }

    /// Total number of rows updated across all objects.
    pub fn number_of_updates(&self) -> usize {
        self.results.iter().map(|(_, r)| r.rows_updated()).sum()
    }

    /// Returns the number of objects put.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no object was put.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Result of deleting one object or running one delete query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteResult {
    rows_deleted: usize,
    affected_tables: TableSet,
}

impl DeleteResult {
    /// Creates a delete result.
    pub fn new<I, S>(rows_deleted: usize, affected_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows_deleted,
            affected_tables: ripple_core::table_set(affected_tables),
        }
    }

    /// Returns the number of deleted rows.
    pub fn rows_deleted(&self) -> usize {
        self.rows_deleted
    }

    /// Returns the tables the delete targeted.
    pub fn affected_tables(&self) -> &TableSet {
        &self.affected_tables
    }

    pub(crate) fn changed_tables(&self) -> impl Iterator<Item = &String> {
        let changed = self.rows_deleted > 0;
        self.affected_tables.iter().filter(move |_| changed)
    }
}

/// Results of deleting a collection, in input order.
#[derive(Clone, Debug)]
pub struct DeleteResults<T> {
    results: Vec<(T, DeleteResult)>,
}

impl<T> DeleteResults<T> {
    pub(crate) fn new(results: Vec<(T, DeleteResult)>) -> Self {
        Self { results }
    }

    /// Returns each object paired with its result.
    pub fn results(&self) -> &[(T, DeleteResult)] {
        &self.results
    }

    /// Consumes the results, returning the pairs.
    pub fn into_results(self) -> Vec<(T, DeleteResult)> {
        self.results
    }

    /// Total number of deleted rows.
    pub fn number_of_deletes(&self) -> usize {
        self.results.iter().map(|(_, r)| r.rows_deleted()).sum()
    }

    /// Returns the number of objects processed.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no object was processed.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
