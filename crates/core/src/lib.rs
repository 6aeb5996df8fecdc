//! Ripple Core - Values, rows and query descriptors for Ripple.
//!
//! This crate provides the foundational types shared by every Ripple crate:
//!
//! - `Value`: A cell value (Null, Integer, Real, Text, Blob)
//! - `Row` / `RowSet`: Raw read results with shared column names
//! - `ContentValues`: Ordered column/value pairs for inserts and updates
//! - `descriptor`: Immutable `Query`, `RawQuery`, `InsertQuery`,
//!   `UpdateQuery` and `DeleteQuery` descriptors with builders
//! - `Error`: Error types for database operations
//!
//! # Example
//!
//! ```rust
//! use ripple_core::descriptor::Query;
//! use ripple_core::Value;
//!
//! let query = Query::builder()
//!     .table("users")
//!     .where_clause("email = ?")
//!     .where_args(["alice@example.com"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(query.table(), "users");
//! assert_eq!(query.where_args(), &[Value::Text("alice@example.com".into())]);
//! assert!(query.observed_tables().contains("users"));
//! ```

mod content_values;
pub mod descriptor;
mod error;
mod row;
mod value;

pub use content_values::ContentValues;
pub use descriptor::{table_set, TableSet};
pub use error::{BoxError, Error, Result};
pub use row::{Columns, Row, RowSet};
pub use value::Value;
