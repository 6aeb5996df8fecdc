//! Ripple Database - Typed prepared operations and live queries.
//!
//! This crate is the public face of Ripple:
//!
//! - `Database`: Store, type mapping registry and change bus in one handle
//! - `TypeMapping`: The get/put/delete resolvers bound to one object type
//! - `operations`: Prepared get, put, delete and raw statement operations
//! - `LiveQuery`: A read that re-runs whenever an observed table changes
//!
//! # Example
//!
//! ```rust
//! use ripple_core::descriptor::{DeleteQuery, InsertQuery, Query, UpdateQuery};
//! use ripple_core::ContentValues;
//! use ripple_database::{
//!     Database, DefaultDeleteResolver, DefaultGetResolver, DefaultPutResolver, SchedulerConfig,
//!     TypeMapping,
//! };
//! use ripple_storage::SqliteStore;
//!
//! struct User {
//!     id: Option<i64>,
//!     email: String,
//! }
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! store.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT)").unwrap();
//!
//! let mapping = TypeMapping::<User>::builder()
//!     .get_resolver(DefaultGetResolver::new(|row| {
//!         Ok(User { id: Some(row.get_i64("id")?), email: row.get_str("email")?.to_string() })
//!     }))
//!     .put_resolver(DefaultPutResolver::new(
//!         |_: &User| InsertQuery::builder().table("users").build(),
//!         |u: &User| {
//!             UpdateQuery::builder()
//!                 .table("users")
//!                 .where_clause("id = ?")
//!                 .where_args([u.id.unwrap_or(-1)])
//!                 .build()
//!         },
//!         |u: &User| ContentValues::new().with("email", u.email.as_str()),
//!     ))
//!     .delete_resolver(DefaultDeleteResolver::new(|u: &User| {
//!         DeleteQuery::builder()
//!             .table("users")
//!             .where_clause("id = ?")
//!             .where_args([u.id.unwrap_or(-1)])
//!             .build()
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let db = Database::builder()
//!     .store(store)
//!     .scheduler(SchedulerConfig::Immediate)
//!     .add_type_mapping(mapping)
//!     .build()
//!     .unwrap();
//!
//! let all = Query::builder().table("users").build().unwrap();
//! let users = db.get().list_of_objects::<User>().with_query(all).prepare().unwrap();
//!
//! let _sub = users.observe().subscribe(
//!     |list| println!("{} users", list.len()),
//!     |err| eprintln!("{}", err),
//! );
//!
//! db.put()
//!     .object(User { id: None, email: "alice@example.com".into() })
//!     .prepare()
//!     .execute_blocking()
//!     .unwrap();
//! assert_eq!(users.execute_blocking().unwrap().len(), 1);
//! ```

pub mod config;
pub mod database;
pub mod operations;
pub mod registry;
pub mod resolver;
pub mod results;
pub mod type_mapping;

pub use config::{DatabaseConfig, DEFAULT_THREAD_NAME_PREFIX};
pub use database::{Database, DatabaseBuilder};
pub use registry::TypeMappingRegistry;
pub use resolver::{
    DefaultDeleteResolver, DefaultGetResolver, DefaultPutResolver, DeleteResolver, GetResolver,
    PutResolver,
};
pub use results::{DeleteResult, DeleteResults, PutResult, PutResults};
pub use type_mapping::{TypeMapping, TypeMappingBuilder};

pub use ripple_core::{ContentValues, Error, Result, Row, RowSet, TableSet, Value};
pub use ripple_reactive::{Changes, LiveQuery, SchedulerConfig, Subscription};
