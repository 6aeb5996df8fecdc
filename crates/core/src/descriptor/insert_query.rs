//! Insert half of a put.

use super::{check_not_empty, TableSet};
use crate::error::Result;

/// Target of an `INSERT`. The inserted values come from the put resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertQuery {
    table: String,
}

impl InsertQuery {
    pub fn builder() -> InsertQueryBuilder {
        InsertQueryBuilder::default()
    }

    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Tables changed when the insert succeeds.
    pub fn affected_tables(&self) -> TableSet {
        super::table_set([self.table.as_str()])
    }
}

/// Builder for [`InsertQuery`].
#[derive(Clone, Debug, Default)]
pub struct InsertQueryBuilder {
    table: Option<String>,
}

impl InsertQueryBuilder {
    /// Required: the table to insert into.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn build(self) -> Result<InsertQuery> {
        check_not_empty(self.table.as_deref(), "Table name is null or empty")?;
        Ok(InsertQuery {
            table: self.table.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let insert = InsertQuery::builder().table("users").build().unwrap();
        assert_eq!(insert.table(), "users");
        assert!(insert.affected_tables().contains("users"));
    }

    #[test]
    fn test_missing_table() {
        assert!(InsertQuery::builder().build().is_err());
        assert!(InsertQuery::builder().table(" ").build().is_err());
    }
}
