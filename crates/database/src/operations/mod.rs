//! Prepared operations.
//!
//! Every operation is built in three steps: pick the kind of operation on
//! [`Database`](crate::Database), configure it on the returned builder, then
//! `prepare()` it. A prepared operation can run any number of times.

mod delete;
mod execute_sql;
mod get;
mod put;

pub use delete::{
    DeleteByQueryBuilder, DeleteObjectBuilder, DeleteObjectsBuilder, PreparedDeleteBuilder,
    PreparedDeleteByQuery, PreparedDeleteObject, PreparedDeleteObjects,
};
pub use execute_sql::{PreparedExecuteSql, PreparedExecuteSqlBuilder};
pub use get::{
    GetListOfObjectsBuilder, GetNumberOfResultsBuilder, GetObjectBuilder, GetRowSetBuilder,
    GetSource, PreparedGetBuilder, PreparedGetListOfObjects, PreparedGetNumberOfResults,
    PreparedGetObject, PreparedGetRowSet,
};
pub use put::{
    PreparedPutBuilder, PreparedPutContentValues, PreparedPutObject, PreparedPutObjects,
    PutContentValuesBuilder, PutObjectBuilder, PutObjectsBuilder,
};
