//! Row and row set structures for Ripple.
//!
//! A `Row` is one result row of a read. Rows of one `RowSet` share their
//! column name list, so cloning a row only clones its values.

use crate::error::{Error, Result};
use crate::value::Value;
use std::sync::Arc;

/// Shared, ordered list of result column names.
pub type Columns = Arc<[String]>;

/// A row of a query result.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Column names, shared with the rest of the row set.
    columns: Columns,
    /// Values indexed by column position.
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row. `values` must be as long as `columns`.
    pub fn new(columns: Columns, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Returns the column names.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of columns in this row.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Gets a value by column position.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the position of a column, or None if absent.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Gets a value by column name, failing if the column is absent.
    pub fn value(&self, name: &str) -> Result<&Value> {
        self.column_index(name)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| Error::illegal_argument(format!("column '{}' does not exist", name)))
    }

    /// Reads an integer column.
    pub fn get_i64(&self, name: &str) -> Result<i64> {
        let value = self.value(name)?;
        value.as_i64().ok_or_else(|| mismatch(name, "INTEGER", value))
    }

    /// Reads a real column. Integer values are widened.
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        let value = self.value(name)?;
        value.as_f64().ok_or_else(|| mismatch(name, "REAL", value))
    }

    /// Reads a text column.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        let value = self.value(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "TEXT", value))
    }

    /// Reads a nullable text column.
    pub fn get_opt_str(&self, name: &str) -> Result<Option<&str>> {
        match self.value(name)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.as_str())),
            other => Err(mismatch(name, "TEXT", other)),
        }
    }

    /// Reads a nullable integer column.
    pub fn get_opt_i64(&self, name: &str) -> Result<Option<i64>> {
        match self.value(name)? {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(*v)),
            other => Err(mismatch(name, "INTEGER", other)),
        }
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

fn mismatch(column: &str, expected: &str, got: &Value) -> Error {
    Error::illegal_argument(format!(
        "column '{}' holds {}, expected {}",
        column,
        got.type_name(),
        expected
    ))
}

/// The raw, cursor-like result of a read: column names plus ordered rows.
#[derive(Clone, Debug, PartialEq)]
pub struct RowSet {
    columns: Columns,
    rows: Vec<Row>,
}

impl RowSet {
    /// Creates an empty row set with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: columns.into(),
            rows: Vec::new(),
        }
    }

    /// Creates a row set from column names and raw value rows.
    pub fn from_values(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut set = Self::new(columns);
        for values in rows {
            set.push(values);
        }
        set
    }

    /// Appends one row of values.
    pub fn push(&mut self, values: Vec<Value>) {
        self.rows.push(Row::new(Arc::clone(&self.columns), values));
    }

    /// Returns the column names.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the first row, if any.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> core::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = core::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
