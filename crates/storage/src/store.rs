//! The store contract consumed by Ripple.
//!
//! A `Store` is the embedded SQL engine plus its connection handling. Ripple
//! treats it as an external collaborator: it only needs statement execution,
//! inserts that report the generated key, and nestable transactions.

use crate::statement::Statement;
use ripple_core::descriptor::{DeleteQuery, Query, RawQuery, UpdateQuery};
use ripple_core::{ContentValues, Result, RowSet, Value};

/// Statement execution against an embedded SQL store.
///
/// Implementations must be safe to call from several threads and must give
/// at least read-committed isolation per statement. Transactions nest: a
/// `begin_transaction` issued while one is open starts a savepoint that the
/// matching commit/rollback releases or rolls back.
pub trait Store: Send + Sync {
    /// Runs a read and returns every row.
    fn execute_query(&self, sql: &str, args: &[Value]) -> Result<RowSet>;

    /// Runs a write and returns the number of affected rows.
    fn execute_update(&self, sql: &str, args: &[Value]) -> Result<usize>;

    /// Inserts one row and returns its generated key.
    fn insert(&self, table: &str, values: &ContentValues) -> Result<i64>;

    /// Opens a transaction, or a savepoint inside the open one.
    fn begin_transaction(&self) -> Result<()>;

    /// Commits the innermost open transaction level.
    fn commit_transaction(&self) -> Result<()>;

    /// Rolls back the innermost open transaction level.
    fn rollback_transaction(&self) -> Result<()>;

    /// Runs a structured read.
    fn query(&self, query: &Query) -> Result<RowSet> {
        let st = Statement::select(query)?;
        self.execute_query(&st.sql, &st.args)
    }

    /// Counts the rows a structured read would return.
    fn count(&self, query: &Query) -> Result<usize> {
        let st = Statement::count(query)?;
        let rows = self.execute_query(&st.sql, &st.args)?;
        Ok(rows
            .first()
            .and_then(|row| row.get(0))
            .and_then(Value::as_i64)
            .unwrap_or(0) as usize)
    }

    /// Runs a raw read.
    fn raw_query(&self, raw: &RawQuery) -> Result<RowSet> {
        let st = Statement::new(raw.query(), raw.args().to_vec());
        st.check()?;
        self.execute_query(&st.sql, &st.args)
    }

    /// Runs a raw write and returns the number of affected rows.
    fn raw_update(&self, raw: &RawQuery) -> Result<usize> {
        let st = Statement::new(raw.query(), raw.args().to_vec());
        st.check()?;
        self.execute_update(&st.sql, &st.args)
    }

    /// Updates the rows selected by `update` with `values`.
    fn update(&self, update: &UpdateQuery, values: &ContentValues) -> Result<usize> {
        let st = Statement::update(update, values)?;
        self.execute_update(&st.sql, &st.args)
    }

    /// Deletes the rows selected by `delete`.
    fn delete(&self, delete: &DeleteQuery) -> Result<usize> {
        let st = Statement::delete(delete)?;
        self.execute_update(&st.sql, &st.args)
    }
}
