//! Structured delete descriptor.

use super::{check_not_empty, check_where, TableSet};
use crate::error::Result;
use crate::value::Value;

/// A structured `DELETE`. Without a selection every row is deleted.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteQuery {
    table: String,
    where_clause: Option<String>,
    where_args: Vec<Value>,
}

impl DeleteQuery {
    pub fn builder() -> DeleteQueryBuilder {
        DeleteQueryBuilder::default()
    }

    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    #[inline]
    pub fn where_args(&self) -> &[Value] {
        &self.where_args
    }

    /// Tables changed when the delete succeeds.
    pub fn affected_tables(&self) -> TableSet {
        super::table_set([self.table.as_str()])
    }
}

/// Builder for [`DeleteQuery`].
#[derive(Clone, Debug, Default)]
pub struct DeleteQueryBuilder {
    table: Option<String>,
    where_clause: Option<String>,
    where_args: Vec<Value>,
}

impl DeleteQueryBuilder {
    /// Required: the table to delete from.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn where_clause(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    pub fn where_args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Result<DeleteQuery> {
        check_not_empty(self.table.as_deref(), "Table name is null or empty")?;
        check_where(self.where_clause.as_deref(), &self.where_args)?;
        Ok(DeleteQuery {
            table: self.table.unwrap_or_default(),
            where_clause: self.where_clause,
            where_args: self.where_args,
        })
    }
}
