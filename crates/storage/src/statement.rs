//! Rendering of descriptors into SQL statements.
//!
//! The store executes plain SQL text plus positional arguments. This module
//! assembles that text from structured descriptors; it never parses SQL.

use ripple_core::descriptor::{check_arguments, DeleteQuery, Query, UpdateQuery};
use ripple_core::{ContentValues, Error, Result, Value};

/// SQL text with its positional arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    /// Creates a statement from raw parts.
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Renders a structured read.
    pub fn select(query: &Query) -> Result<Self> {
        let mut sql = String::from("SELECT ");
        if query.distinct() {
            sql.push_str("DISTINCT ");
        }
        if query.columns().is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&query.columns().join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(query.table());
        push_clause(&mut sql, " WHERE ", query.where_clause());
        push_clause(&mut sql, " GROUP BY ", query.group_by());
        push_clause(&mut sql, " HAVING ", query.having());
        push_clause(&mut sql, " ORDER BY ", query.order_by());
        if let Some(limit) = query.limit() {
            sql.push_str(&format!(" LIMIT {}", limit.count));
            if let Some(offset) = limit.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        let statement = Self::new(sql, query.where_args().to_vec());
        statement.check()?;
        Ok(statement)
    }

    /// Renders a row count of a structured read.
    pub fn count(query: &Query) -> Result<Self> {
        let inner = Self::select(query)?;
        Ok(Self::new(
            format!("SELECT COUNT(*) FROM ({})", inner.sql),
            inner.args,
        ))
    }

    /// Renders an insert of `values` into `table`.
    pub fn insert(table: &str, values: &ContentValues) -> Self {
        if values.is_empty() {
            return Self::new(format!("INSERT INTO {} DEFAULT VALUES", table), Vec::new());
        }
        let columns: Vec<&str> = values.iter().map(|(c, _)| c).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        Self::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders
            ),
            values.iter().map(|(_, v)| v.clone()).collect(),
        )
    }

    /// Renders an update. The `SET` arguments precede the selection arguments.
    pub fn update(update: &UpdateQuery, values: &ContentValues) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::illegal_argument("Empty values for update"));
        }
        let assignments: Vec<String> = values.iter().map(|(c, _)| format!("{} = ?", c)).collect();
        let mut sql = format!("UPDATE {} SET {}", update.table(), assignments.join(", "));
        push_clause(&mut sql, " WHERE ", update.where_clause());

        let mut args: Vec<Value> = values.iter().map(|(_, v)| v.clone()).collect();
        args.extend_from_slice(update.where_args());

        let statement = Self::new(sql, args);
        statement.check()?;
        Ok(statement)
    }

    /// Renders a structured delete.
    pub fn delete(delete: &DeleteQuery) -> Result<Self> {
        let mut sql = format!("DELETE FROM {}", delete.table());
        push_clause(&mut sql, " WHERE ", delete.where_clause());
        let statement = Self::new(sql, delete.where_args().to_vec());
        statement.check()?;
        Ok(statement)
    }

    /// Checks that the arguments match the placeholders.
    pub fn check(&self) -> Result<()> {
        check_arguments(&self.sql, &self.args)
    }
}

fn push_clause(sql: &mut String, keyword: &str, clause: Option<&str>) {
    if let Some(clause) = clause.filter(|c| !c.trim().is_empty()) {
        sql.push_str(keyword);
        sql.push_str(clause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all() {
        let query = Query::builder().table("users").build().unwrap();
        let st = Statement::select(&query).unwrap();
        assert_eq!(st.sql, "SELECT * FROM users");
        assert!(st.args.is_empty());
    }

    #[test]
    fn test_select_full() {
        let query = Query::builder()
            .table("users")
            .distinct(true)
            .columns(["email", "COUNT(*)"])
            .where_clause("id > ?")
            .where_args([5i64])
            .group_by("email")
            .having("COUNT(*) > 1")
            .order_by("email")
            .limit_offset(10, 2)
            .build()
            .unwrap();

        let st = Statement::select(&query).unwrap();
        assert_eq!(
            st.sql,
            "SELECT DISTINCT email, COUNT(*) FROM users WHERE id > ? GROUP BY email \
             HAVING COUNT(*) > 1 ORDER BY email LIMIT 2 OFFSET 10"
        );
        assert_eq!(st.args, vec![Value::Integer(5)]);
    }

    #[test]
    fn test_select_argument_mismatch() {
        let query = Query::builder()
            .table("users")
            .where_clause("id = ? OR id = ?")
            .where_args([1i64])
            .build()
            .unwrap();
        let err = Statement::select(&query).unwrap_err();
        assert!(err.is_query_execution());
    }

    #[test]
    fn test_count() {
        let query = Query::builder().table("users").build().unwrap();
        let st = Statement::count(&query).unwrap();
        assert_eq!(st.sql, "SELECT COUNT(*) FROM (SELECT * FROM users)");
    }

    #[test]
    fn test_insert() {
        let values = ContentValues::new().with("id", 1i64).with("email", "a@x.io");
        let st = Statement::insert("users", &values);
        assert_eq!(st.sql, "INSERT INTO users (id, email) VALUES (?, ?)");
        assert_eq!(st.args.len(), 2);

        let st = Statement::insert("users", &ContentValues::new());
        assert_eq!(st.sql, "INSERT INTO users DEFAULT VALUES");
    }

    #[test]
    fn test_update_argument_order() {
        let update = UpdateQuery::builder()
            .table("users")
            .where_clause("id = ?")
            .where_args([7i64])
            .build()
            .unwrap();
        let values = ContentValues::new().with("email", "new@x.io");

        let st = Statement::update(&update, &values).unwrap();
        assert_eq!(st.sql, "UPDATE users SET email = ? WHERE id = ?");
        assert_eq!(st.args, vec![Value::from("new@x.io"), Value::Integer(7)]);
    }

    #[test]
    fn test_update_empty_values() {
        let update = UpdateQuery::builder().table("users").build().unwrap();
        assert!(Statement::update(&update, &ContentValues::new()).is_err());
    }

    #[test]
    fn test_delete() {
        let delete = DeleteQuery::builder()
            .table("users")
            .where_clause("id = ?")
            .where_args([1i64])
            .build()
            .unwrap();
        let st = Statement::delete(&delete).unwrap();
        assert_eq!(st.sql, "DELETE FROM users WHERE id = ?");
    }
}
