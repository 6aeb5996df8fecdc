use super::DeleteResolver;
use crate::results::DeleteResult;
use ripple_core::descriptor::DeleteQuery;
use ripple_core::Result;
use ripple_storage::Store;

type DeleteQueryFn<T> = Box<dyn Fn(&T) -> Result<DeleteQuery> + Send + Sync>;

/// A [`DeleteResolver`] that deletes the rows selected by a per-object
/// [`DeleteQuery`].
pub struct DefaultDeleteResolver<T> {
    delete_query: DeleteQueryFn<T>,
}

impl<T> DefaultDeleteResolver<T> {
    /// Creates a resolver from a function building the delete query.
    pub fn new<F>(delete_query: F) -> Self
    where
        F: Fn(&T) -> Result<DeleteQuery> + Send + Sync + 'static,
    {
        Self {
            delete_query: Box::new(delete_query),
        }
    }
}

impl<T> DeleteResolver<T> for DefaultDeleteResolver<T> {
    fn perform_delete(&self, store: &dyn Store, object: &T) -> Result<DeleteResult> {
        let query = (self.delete_query)(object)?;
        let rows_deleted = store.delete(&query)?;
        Ok(DeleteResult::new(rows_deleted, query.affected_tables()))
    }
}
