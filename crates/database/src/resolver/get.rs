use super::GetResolver;
use ripple_core::{Result, Row};

type MapFn<T> = Box<dyn Fn(&Row) -> Result<T> + Send + Sync>;

/// A [`GetResolver`] that maps rows with a closure.
pub struct DefaultGetResolver<T> {
    map: MapFn<T>,
}

impl<T> DefaultGetResolver<T> {
    /// Creates a resolver from a row mapping function.
    pub fn new<F>(map: F) -> Self
    where
        F: Fn(&Row) -> Result<T> + Send + Sync + 'static,
    {
        Self { map: Box::new(map) }
    }
}

impl<T> GetResolver<T> for DefaultGetResolver<T> {
    fn map_from_row(&self, row: &Row) -> Result<T> {
        (self.map)(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::{RowSet, Value};

    #[test]
    fn test_map_from_row() {
        let resolver = DefaultGetResolver::new(|row: &Row| row.get_str("email").map(str::to_string));
        let rows = RowSet::from_values(
            vec!["id".into(), "email".into()],
            vec![vec![Value::Integer(1), Value::from("a@x.io")]],
        );
        let row = rows.first().unwrap();
        assert_eq!(resolver.map_from_row(row).unwrap(), "a@x.io");
    }

    #[test]
    fn test_map_error_propagates() {
        let resolver = DefaultGetResolver::new(|row: &Row| row.get_i64("missing"));
        let rows = RowSet::from_values(vec!["id".into()], vec![vec![Value::Integer(1)]]);
        assert!(resolver.map_from_row(rows.first().unwrap()).is_err());
    }
}
