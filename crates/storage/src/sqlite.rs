//! SQLite store backed by rusqlite (bundled).
//!
//! The connection is protected by a `parking_lot::ReentrantMutex<RefCell<..>>`
//! so that a thread already holding the lock can issue further statements.
//! Every transaction level, including the outermost, is a named SAVEPOINT,
//! which lets levels nest freely.
//!
//! All statements share one connection, so an open transaction belongs to
//! the thread that began it. Until its outermost level closes, statements
//! from any other thread wait; they never see uncommitted writes.

use crate::store::Store;
use crate::statement::Statement;
use log::{debug, trace};
use parking_lot::{Condvar, Mutex, ReentrantMutex, ReentrantMutexGuard};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use ripple_core::{ContentValues, Error, Result, RowSet, Value};
use std::cell::RefCell;
use std::path::Path;
use std::thread::{self, ThreadId};

struct Inner {
    conn: Connection,
    /// Number of open savepoints.
    depth: usize,
}

/// SQLite implementation of [`Store`].
pub struct SqliteStore {
    inner: ReentrantMutex<RefCell<Inner>>,
    /// Thread holding the open transaction, if any. Taken only after
    /// `inner`, and never held while waiting for it.
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
}

type ConnectionGuard<'a> = ReentrantMutexGuard<'a, RefCell<Inner>>;

impl SqliteStore {
    /// Opens a file-backed database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::store(format!("open {}", path.as_ref().display()), e))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::store("open in-memory", e))?;
        Self::from_connection(conn)
    }

    /// Wraps an already opened connection.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::store("configure connection", e))?;
        Ok(Self {
            inner: ReentrantMutex::new(RefCell::new(Inner { conn, depth: 0 })),
            owner: Mutex::new(None),
            released: Condvar::new(),
        })
    }

    /// Runs a batch of semicolon separated statements, typically schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let guard = self.connection();
        let inner = guard.borrow();
        inner
            .conn
            .execute_batch(sql)
            .map_err(|e| Error::store("execute batch", e))
    }

    /// Number of currently open transaction levels.
    pub fn transaction_depth(&self) -> usize {
        self.inner.lock().borrow().depth
    }

    fn savepoint_name(level: usize) -> String {
        format!("ripple_sp_{}", level)
    }

    /// Locks the connection, waiting while another thread has a
    /// transaction open.
    fn connection(&self) -> ConnectionGuard<'_> {
        let me = thread::current().id();
        loop {
            let guard = self.inner.lock();
            let mut owner = self.owner.lock();
            match *owner {
                Some(other) if other != me => {
                    drop(guard);
                    self.released.wait(&mut owner);
                }
                _ => return guard,
            }
        }
    }

    /// Locks the connection to close a transaction level. Fails instead of
    /// waiting if another thread owns the transaction.
    fn owned_connection(&self, action: &str) -> Result<ConnectionGuard<'_>> {
        let guard = self.inner.lock();
        match *self.owner.lock() {
            Some(other) if other != thread::current().id() => Err(Error::illegal_argument(
                format!("{} from a thread that does not own the transaction", action),
            )),
            _ => Ok(guard),
        }
    }

    /// Called with the connection locked once the outermost level closed.
    fn release_owner(&self) {
        *self.owner.lock() = None;
        self.released.notify_all();
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Blob(v) => SqlValue::Blob(v.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec()),
    }
}

fn run_update(conn: &Connection, sql: &str, args: &[Value]) -> Result<usize> {
    let mut stmt = conn.prepare_cached(sql).map_err(exec_err(sql))?;
    stmt.execute(params_from_iter(args.iter().map(to_sql)))
        .map_err(exec_err(sql))
}

fn exec_err(sql: &str) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |e| Error::store(sql.to_string(), e)
}

impl Store for SqliteStore {
    fn execute_query(&self, sql: &str, args: &[Value]) -> Result<RowSet> {
        trace!("query: {}", sql);
        let guard = self.connection();
        let inner = guard.borrow();

        let mut stmt = inner.conn.prepare_cached(sql).map_err(exec_err(sql))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let mut result = RowSet::new(columns);

        let mut rows = stmt
            .query(params_from_iter(args.iter().map(to_sql)))
            .map_err(exec_err(sql))?;
        while let Some(row) = rows.next().map_err(exec_err(sql))? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sql(row.get_ref(i).map_err(exec_err(sql))?));
            }
            result.push(values);
        }
        Ok(result)
    }

    fn execute_update(&self, sql: &str, args: &[Value]) -> Result<usize> {
        trace!("update: {}", sql);
        let guard = self.connection();
        let inner = guard.borrow();
        run_update(&inner.conn, sql, args)
    }

    fn insert(&self, table: &str, values: &ContentValues) -> Result<i64> {
        let st = Statement::insert(table, values);
        trace!("insert: {}", st.sql);
        let guard = self.connection();
        let inner = guard.borrow();
        run_update(&inner.conn, &st.sql, &st.args)?;
        Ok(inner.conn.last_insert_rowid())
    }

    fn begin_transaction(&self) -> Result<()> {
        let guard = self.connection();
        let mut inner = guard.borrow_mut();
        let name = Self::savepoint_name(inner.depth);
        inner
            .conn
            .execute_batch(&format!("SAVEPOINT {}", name))
            .map_err(|e| Error::store("begin transaction", e))?;
        inner.depth += 1;
        if inner.depth == 1 {
            *self.owner.lock() = Some(thread::current().id());
        }
        debug!("savepoint {} opened", name);
        Ok(())
    }

    fn commit_transaction(&self) -> Result<()> {
        let guard = self.owned_connection("commit")?;
        let mut inner = guard.borrow_mut();
        if inner.depth == 0 {
            return Err(Error::query_execution("commit without an open transaction"));
        }
        let name = Self::savepoint_name(inner.depth - 1);
        inner
            .conn
            .execute_batch(&format!("RELEASE SAVEPOINT {}", name))
            .map_err(|e| Error::store("commit transaction", e))?;
        inner.depth -= 1;
        if inner.depth == 0 {
            self.release_owner();
        }
        debug!("savepoint {} released", name);
        Ok(())
    }

    fn rollback_transaction(&self) -> Result<()> {
        let guard = self.owned_connection("rollback")?;
        let mut inner = guard.borrow_mut();
        if inner.depth == 0 {
            return Err(Error::query_execution("rollback without an open transaction"));
        }
        let name = Self::savepoint_name(inner.depth - 1);
        // The level is closed even if SQLite refuses.
        inner.depth -= 1;
        if inner.depth == 0 {
            self.release_owner();
        }
        inner
            .conn
            .execute_batch(&format!(
                "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name};"
            ))
            .map_err(|e| Error::store("rollback transaction", e))?;
        debug!("savepoint {} rolled back", name);
        Ok(())
    }
}
