//! Immutable query descriptors.
//!
//! Every database operation is described by one of these values:
//!
//! - `Query`: a structured read of one table
//! - `RawQuery`: a raw SQL statement with its affected / observed tables
//! - `InsertQuery`, `UpdateQuery`: the two halves of a put
//! - `DeleteQuery`: a structured delete
//!
//! Descriptors are built once through their builder, never mutated, and can
//! be shared across threads and executed any number of times. Builders
//! validate required fields in `build()`; the argument count of a selection
//! is only checked when the descriptor is executed.

mod delete_query;
mod insert_query;
mod query;
mod raw_query;
mod update_query;

pub use delete_query::{DeleteQuery, DeleteQueryBuilder};
pub use insert_query::{InsertQuery, InsertQueryBuilder};
pub use query::{Limit, Query, QueryBuilder};
pub use raw_query::{RawQuery, RawQueryBuilder};
pub use update_query::{UpdateQuery, UpdateQueryBuilder};

use crate::error::{Error, Result};
use crate::value::Value;

/// A set of table names, used for the affects / observes sets.
pub type TableSet = hashbrown::HashSet<String>;

/// Builds a `TableSet` from anything yielding table names.
pub fn table_set<I, S>(tables: I) -> TableSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tables.into_iter().map(Into::into).collect()
}

/// Fails with `IllegalArgument` if a required string is missing or blank.
pub(crate) fn check_not_empty(value: Option<&str>, message: &str) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(Error::illegal_argument(message)),
    }
}

/// Selection arguments are only meaningful together with a selection.
pub(crate) fn check_where(where_clause: Option<&str>, where_args: &[Value]) -> Result<()> {
    let has_clause = where_clause.map(|w| !w.trim().is_empty()).unwrap_or(false);
    if !has_clause && !where_args.is_empty() {
        return Err(Error::illegal_argument(
            "where arguments can not be used without a where clause",
        ));
    }
    Ok(())
}

/// Number of arguments `sql` binds, following SQLite's numbering: a bare
/// `?` takes the next index after the largest one seen so far, and `?NNN`
/// takes index NNN, so a reused `?1` needs one argument. Placeholders
/// inside quoted literals, bracketed identifiers and comments are skipped.
pub fn placeholder_count(sql: &str) -> usize {
    let mut highest = 0;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                for next in chars.by_ref() {
                    if next == close {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut star = false;
                for next in chars.by_ref() {
                    if star && next == '/' {
                        break;
                    }
                    star = next == '*';
                }
            }
            '?' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                highest = match digits.parse::<usize>() {
                    Ok(index) => highest.max(index),
                    Err(_) => highest + 1,
                };
            }
            _ => {}
        }
    }
    highest
}

/// Checks that `args` binds every placeholder of `sql` exactly once.
pub fn check_arguments(sql: &str, args: &[Value]) -> Result<()> {
    let expected = placeholder_count(sql);
    if expected != args.len() {
        return Err(Error::query_execution(format!(
            "statement expects {} arguments but {} were bound: {}",
            expected,
            args.len(),
            sql
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_count() {
        assert_eq!(placeholder_count("SELECT * FROM users"), 0);
        assert_eq!(placeholder_count("id = ? AND email = ?"), 2);
        assert_eq!(placeholder_count("name = '?' AND id = ?"), 1);
        assert_eq!(placeholder_count("\"odd?col\" = ?"), 1);
        assert_eq!(placeholder_count("[odd?col] = ?"), 1);
    }

    #[test]
    fn test_numbered_placeholders() {
        assert_eq!(placeholder_count("id = ?1 OR author_id = ?1"), 1);
        assert_eq!(placeholder_count("a = ?2 AND b = ?1"), 2);
        assert_eq!(placeholder_count("a = ?3"), 3);
        assert_eq!(placeholder_count("a = ?2 AND b = ?"), 3);
        assert!(check_arguments("id = ?1 OR author_id = ?1", &[Value::Integer(7)]).is_ok());
    }

    #[test]
    fn test_placeholders_in_comments() {
        assert_eq!(placeholder_count("id = ? -- why?\n AND email = ?"), 2);
        assert_eq!(placeholder_count("id = ? /* or ? */"), 1);
        assert_eq!(placeholder_count("id = ? -- trailing?"), 1);
        assert_eq!(placeholder_count("id = ? /* unterminated ?"), 1);
    }

    #[test]
    fn test_check_arguments() {
        assert!(check_arguments("id = ?", &[Value::Integer(1)]).is_ok());
        let err = check_arguments("id = ?", &[]).unwrap_err();
        assert!(err.is_query_execution());
    }

    #[test]
    fn test_check_not_empty() {
        assert!(check_not_empty(Some("users"), "x").is_ok());
        assert!(check_not_empty(Some("  "), "x").is_err());
        assert!(check_not_empty(None, "x").is_err());
    }

    #[test]
    fn test_table_set() {
        let tables = table_set(["users", "tweets", "users"]);
        assert_eq!(tables.len(), 2);
        assert!(tables.contains("tweets"));
    }
}
