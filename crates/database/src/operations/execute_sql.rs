//! Prepared raw statements.

use crate::database::Database;
use ripple_core::descriptor::RawQuery;
use ripple_core::{Error, Result};

/// Entry point returned by [`Database::execute_sql`].
pub struct PreparedExecuteSqlBuilder {
    db: Database,
    query: Option<RawQuery>,
}

impl PreparedExecuteSqlBuilder {
    pub(crate) fn new(db: Database) -> Self {
        Self { db, query: None }
    }

    /// Sets the statement to run.
    pub fn with_query(mut self, query: RawQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Fails with `IllegalArgument` if no query was given.
    pub fn prepare(self) -> Result<PreparedExecuteSql> {
        let query = self
            .query
            .ok_or_else(|| Error::illegal_argument("Please specify query"))?;
        Ok(PreparedExecuteSql { db: self.db, query })
    }
}

/// Runs a raw write statement.
pub struct PreparedExecuteSql {
    db: Database,
    query: RawQuery,
}

impl PreparedExecuteSql {
    /// Runs the statement and publishes its `affects_tables`, if any.
    /// Returns the number of affected rows.
    pub fn execute_blocking(&self) -> Result<usize> {
        self.db.write(|store, touched| {
            let affected = store.raw_update(&self.query)?;
            touched.extend(self.query.affects_tables().iter().cloned());
            Ok(affected)
        })
    }
}
