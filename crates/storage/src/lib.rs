//! Ripple Storage - Store contract and SQLite backend for Ripple.
//!
//! This crate provides the storage side of Ripple:
//!
//! - `Store`: The statement-execution contract Ripple consumes
//! - `Statement`: Rendering of descriptors into SQL text + arguments
//! - `Transaction`: A guard around one (possibly nested) transaction level
//! - `SqliteStore`: `Store` implementation on rusqlite
//!
//! # Example
//!
//! ```rust
//! use ripple_storage::{SqliteStore, Store, Transaction};
//! use ripple_core::descriptor::Query;
//! use ripple_core::ContentValues;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! store.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT)").unwrap();
//!
//! let tx = Transaction::begin(&store).unwrap();
//! store.insert("users", &ContentValues::new().with("email", "alice@example.com")).unwrap();
//! tx.commit().unwrap();
//!
//! let all = Query::builder().table("users").build().unwrap();
//! assert_eq!(store.query(&all).unwrap().len(), 1);
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod statement;
pub mod store;
pub mod transaction;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use statement::Statement;
pub use store::Store;
pub use transaction::{Transaction, TransactionId, TransactionState};
