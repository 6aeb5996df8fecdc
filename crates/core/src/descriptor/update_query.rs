//! Update half of a put.

use super::{check_not_empty, check_where, TableSet};
use crate::error::Result;
use crate::value::Value;

/// Target and selection of an `UPDATE`. The new values come from the put
/// resolver. Without a selection every row of the table is updated.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateQuery {
    table: String,
    where_clause: Option<String>,
    where_args: Vec<Value>,
}

impl UpdateQuery {
    pub fn builder() -> UpdateQueryBuilder {
        UpdateQueryBuilder::default()
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

    /// Tables changed when the update succeeds.
    pub fn affected_tables(&self) -> TableSet {
        super::table_set([self.table.as_str()])
    }
}

/// Builder for [`UpdateQuery`].
#[derive(Clone, Debug, Default)]
pub struct UpdateQueryBuilder {
    table: Option<String>,
    where_clause: Option<String>,
    where_args: Vec<Value>,
}

impl UpdateQueryBuilder {
    /// Required: the table to update.
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

    pub fn build(self) -> Result<UpdateQuery> {
        check_not_empty(self.table.as_deref(), "Table name is null or empty")?;
        check_where(self.where_clause.as_deref(), &self.where_args)?;
        Ok(UpdateQuery {
            table: self.table.unwrap_or_default(),
            where_clause: self.where_clause,
            where_args: self.where_args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let update = UpdateQuery::builder()
            .table("users")
            .where_clause("id = ?")
            .where_args([3i64])
            .build()
            .unwrap();

        assert_eq!(update.where_clause(), Some("id = ?"));
        assert_eq!(update.where_args(), &[Value::Integer(3)]);
    }

    #[test]
    fn test_args_without_where() {
        assert!(UpdateQuery::builder()
            .table("users")
            .where_args([3i64])
            .build()
            .is_err());
    }
}
