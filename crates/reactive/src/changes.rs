//! Table change notifications.
//!
//! A `Changes` value is the only payload the change bus delivers: the set of
//! tables touched by one successful write. Subscribers re-query on their own.

use core::fmt;
use ripple_core::TableSet;
use std::sync::Arc;

/// An immutable set of changed table names.
///
/// Cloning is cheap; the table set is shared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    tables: Arc<TableSet>,
}

impl Changes {
    /// Creates a notification for the given tables.
    pub fn new(tables: TableSet) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    /// Creates a notification for the given table names.
    pub fn from_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ripple_core::table_set(tables))
    }

    /// Creates a notification for one table.
    pub fn from_table(table: impl Into<String>) -> Self {
        Self::from_tables([table])
    }

    /// Returns the changed tables.
    #[inline]
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    /// Returns true if no table changed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the number of changed tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if `table` changed.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Returns true if any of `observed` changed.
    pub fn intersects(&self, observed: &TableSet) -> bool {
        if observed.len() < self.tables.len() {
            observed.iter().any(|t| self.tables.contains(t))
        } else {
            self.tables.iter().any(|t| observed.contains(t))
        }
    }

    /// Merges another notification into this one.
    pub fn merge(&mut self, other: &Changes) {
        if other.tables.iter().all(|t| self.tables.contains(t)) {
            return;
        }
        let tables = Arc::make_mut(&mut self.tables);
        tables.extend(other.tables.iter().cloned());
    }
}

impl fmt::Display for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.tables.iter().map(String::as_str).collect();
        names.sort_unstable();
        write!(f, "Changes{{{}}}", names.join(", "))
    }
}

impl From<TableSet> for Changes {
    fn from(tables: TableSet) -> Self {
        Self::new(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::table_set;

    #[test]
    fn test_changes_new() {
        let changes = Changes::from_tables(["users", "tweets"]);
        assert_eq!(changes.len(), 2);
        assert!(changes.contains("users"));
        assert!(!changes.is_empty());
        assert!(Changes::default().is_empty());
    }

    #[test]
    fn test_changes_intersects() {
        let changes = Changes::from_tables(["users", "tweets"]);
        assert!(changes.intersects(&table_set(["tweets"])));
        assert!(changes.intersects(&table_set(["a", "b", "c", "users"])));
        assert!(!changes.intersects(&table_set(["comments"])));
        assert!(!changes.intersects(&TableSet::new()));
    }

    #[test]
    fn test_changes_merge() {
        let mut a = Changes::from_table("users");
        let shared = a.clone();
        a.merge(&Changes::from_table("tweets"));

        assert_eq!(a.len(), 2);
        // The clone taken before merging is untouched.
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_changes_merge_subset_is_noop() {
        let mut a = Changes::from_tables(["users", "tweets"]);
        a.merge(&Changes::from_table("users"));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_changes_display_sorted() {
        let changes = Changes::from_tables(["users", "audit"]);
        assert_eq!(changes.to_string(), "Changes{audit, users}");
    }
}
