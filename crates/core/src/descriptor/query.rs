//! Structured read of a single table.

use super::{check_not_empty, check_where, placeholder_count, TableSet};
use crate::error::{Error, Result};
use crate::value::Value;

/// A structured `SELECT` against one table.
///
/// The queried table is always part of [`observed_tables`](Query::observed_tables);
/// extra tables (for example ones joined through a sub-select in the
/// selection) can be added with [`QueryBuilder::observes_tables`].
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    table: String,
    distinct: bool,
    columns: Vec<String>,
    where_clause: Option<String>,
    where_args: Vec<Value>,
    group_by: Option<String>,
    having: Option<String>,
    order_by: Option<String>,
    limit: Option<Limit>,
    observes_tables: TableSet,
}

/// `LIMIT count OFFSET offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limit {
    pub count: u64,
    pub offset: Option<u64>,
}

impl Query {
    /// Starts a new builder.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Returns the queried table.
    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether duplicate rows are removed.
    #[inline]
    pub fn distinct(&self) -> bool {
        self.distinct
    }

    /// Columns to return. Empty means all columns.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The selection, without the `WHERE` keyword.
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Arguments bound to the selection placeholders.
    #[inline]
    pub fn where_args(&self) -> &[Value] {
        &self.where_args
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    pub fn having(&self) -> Option<&str> {
        self.having.as_deref()
    }

    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    pub fn limit(&self) -> Option<Limit> {
        self.limit
    }

    /// All tables whose changes should re-run this query.
    pub fn observed_tables(&self) -> TableSet {
        let mut tables = self.observes_tables.clone();
        tables.insert(self.table.clone());
        tables
    }

    /// Returns a builder pre-filled with this query's fields.
    pub fn to_builder(&self) -> QueryBuilder {
        QueryBuilder {
            table: Some(self.table.clone()),
            distinct: self.distinct,
            columns: self.columns.clone(),
            where_clause: self.where_clause.clone(),
            where_args: self.where_args.clone(),
            group_by: self.group_by.clone(),
            having: self.having.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            observes_tables: self.observes_tables.clone(),
        }
    }
}

/// Builder for [`Query`].
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    table: Option<String>,
    distinct: bool,
    columns: Vec<String>,
    where_clause: Option<String>,
    where_args: Vec<Value>,
    group_by: Option<String>,
    having: Option<String>,
    order_by: Option<String>,
    limit: Option<Limit>,
    observes_tables: TableSet,
}

impl QueryBuilder {
    /// Required: the table to read.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Columns to return, in order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Selection, may contain `?` placeholders.
    pub fn where_clause(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    /// Arguments for the selection placeholders.
    pub fn where_args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    /// Group filter, inlined as written. It takes no arguments, so values
    /// belong in the SQL text; `build()` rejects a `?` here.
    pub fn having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(Limit { count, offset: None });
        self
    }

    pub fn limit_offset(mut self, offset: u64, count: u64) -> Self {
        self.limit = Some(Limit {
            count,
            offset: Some(offset),
        });
        self
    }

    /// Additional tables to observe besides the queried one.
    pub fn observes_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observes_tables.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Builds the immutable query.
    pub fn build(self) -> Result<Query> {
        check_not_empty(self.table.as_deref(), "Table name is null or empty")?;
        check_where(self.where_clause.as_deref(), &self.where_args)?;
        if self.having.is_some() && self.group_by.is_none() {
            return Err(Error::illegal_argument(
                "having clauses are only permitted when using a group by clause",
            ));
        }
        if self.having.as_deref().map_or(0, placeholder_count) > 0 {
            return Err(Error::illegal_argument(
                "having clauses can not contain argument placeholders",
            ));
        }
        if self.columns.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::illegal_argument("Column name is empty"));
        }

        Ok(Query {
            table: self.table.unwrap_or_default(),
            distinct: self.distinct,
            columns: self.columns,
            where_clause: self.where_clause,
            where_args: self.where_args,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            limit: self.limit,
            observes_tables: self.observes_tables,
        })
    }
}
