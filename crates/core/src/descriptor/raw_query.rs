//! Raw SQL statement descriptor.

use super::{check_not_empty, TableSet};
use crate::error::Result;
use crate::value::Value;

/// A raw SQL statement.
///
/// `affects_tables` are notified after the statement runs through
/// `execute_sql`; `observes_tables` are watched when the statement is used
/// as a live read. Both may be empty.
#[derive(Clone, Debug, PartialEq)]
pub struct RawQuery {
    query: String,
    args: Vec<Value>,
    affects_tables: TableSet,
    observes_tables: TableSet,
}

impl RawQuery {
    /// Starts a new builder.
    pub fn builder() -> RawQueryBuilder {
        RawQueryBuilder::default()
    }

    /// The SQL text. May contain `?` placeholders.
    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Arguments bound to the placeholders.
    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Tables modified by this statement.
    #[inline]
    pub fn affects_tables(&self) -> &TableSet {
        &self.affects_tables
    }

    /// Tables whose changes should re-run this statement.
    #[inline]
    pub fn observes_tables(&self) -> &TableSet {
        &self.observes_tables
    }
}

/// Builder for [`RawQuery`].
#[derive(Clone, Debug, Default)]
pub struct RawQueryBuilder {
    query: Option<String>,
    args: Vec<Value>,
    affects_tables: TableSet,
    observes_tables: TableSet,
}

impl RawQueryBuilder {
    /// Required: the SQL text.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Values bound to the statement's placeholders, in order. Replaces
    /// any earlier arguments. The count is checked against the SQL when the
    /// statement runs.
    pub fn args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Adds tables that this statement modifies.
    pub fn affects_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affects_tables.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Adds tables that this statement reads.
    pub fn observes_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observes_tables.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Builds the immutable statement.
    pub fn build(self) -> Result<RawQuery> {
        check_not_empty(self.query.as_deref(), "Query is null or empty")?;
        Ok(RawQuery {
            query: self.query.unwrap_or_default(),
            args: self.args,
            affects_tables: self.affects_tables,
            observes_tables: self.observes_tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_build() {
        let raw = RawQuery::builder()
            .query("UPDATE users SET email = ? WHERE id = ?")
            .args([Value::from("new@x.io"), Value::from(1i64)])
            .affects_tables(["users"])
            .affects_tables(["audit"])
            .build()
            .unwrap();

        assert_eq!(raw.args().len(), 2);
        assert_eq!(raw.affects_tables().len(), 2);
        assert!(raw.observes_tables().is_empty());
    }

    #[test]
    fn test_empty_query() {
        let err = RawQuery::builder().query("").build().unwrap_err();
        assert!(matches!(err, Error::IllegalArgument { .. }));
        assert!(RawQuery::builder().build().is_err());
    }

    #[test]
    fn test_equality() {
        let a = RawQuery::builder()
            .query("SELECT 1")
            .observes_tables(["a", "b"])
            .build()
            .unwrap();
        let b = RawQuery::builder()
            .query("SELECT 1")
            .observes_tables(["b", "a"])
            .build()
            .unwrap();
        assert_eq!(a, b);
    }
}
