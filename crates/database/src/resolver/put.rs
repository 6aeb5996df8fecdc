use super::PutResolver;
use crate::results::PutResult;
use log::trace;
use ripple_core::descriptor::{InsertQuery, Query, UpdateQuery};
use ripple_core::{ContentValues, Result};
use ripple_storage::Store;

type InsertQueryFn<T> = Box<dyn Fn(&T) -> Result<InsertQuery> + Send + Sync>;
type UpdateQueryFn<T> = Box<dyn Fn(&T) -> Result<UpdateQuery> + Send + Sync>;
type ContentValuesFn<T> = Box<dyn Fn(&T) -> ContentValues + Send + Sync>;

/// A [`PutResolver`] that inserts or updates depending on whether the
/// update selection already matches a row.
///
/// The update selection doubles as the primary-key lookup: if it matches no
/// row the object is inserted, otherwise the matching rows are updated.
pub struct DefaultPutResolver<T> {
    insert_query: InsertQueryFn<T>,
    update_query: UpdateQueryFn<T>,
    content_values: ContentValuesFn<T>,
}

impl<T> DefaultPutResolver<T> {
    /// Creates a resolver from the three mapping functions.
    pub fn new<I, U, C>(insert_query: I, update_query: U, content_values: C) -> Self
    where
        I: Fn(&T) -> Result<InsertQuery> + Send + Sync + 'static,
        U: Fn(&T) -> Result<UpdateQuery> + Send + Sync + 'static,
        C: Fn(&T) -> ContentValues + Send + Sync + 'static,
    {
        Self {
            insert_query: Box::new(insert_query),
            update_query: Box::new(update_query),
            content_values: Box::new(content_values),
        }
    }
}

fn existing_rows_query(update: &UpdateQuery) -> Result<Query> {
    let mut builder = Query::builder().table(update.table());
    if let Some(selection) = update.where_clause() {
        builder = builder
            .where_clause(selection)
            .where_args(update.where_args().iter().cloned());
    }
    builder.build()
}

impl<T> PutResolver<T> for DefaultPutResolver<T> {
    fn perform_put(&self, store: &dyn Store, object: &T) -> Result<PutResult> {
        let update = (self.update_query)(object)?;
        let existing = store.count(&existing_rows_query(&update)?)?;
        let values = (self.content_values)(object);

        if existing == 0 {
            let insert = (self.insert_query)(object)?;
            let id = store.insert(insert.table(), &values)?;
            trace!("inserted row {} into {}", id, insert.table());
            Ok(PutResult::new_insert_result(id, insert.affected_tables()))
        } else {
            let rows_updated = store.update(&update, &values)?;
            trace!("updated {} rows in {}", rows_updated, update.table());
            Ok(PutResult::new_update_result(rows_updated, update.affected_tables()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_storage::SqliteStore;

    #[derive(Clone)]
    struct Tag {
        id: i64,
        name: &'static str,
    }

    fn resolver() -> DefaultPutResolver<Tag> {
        DefaultPutResolver::new(
            |_: &Tag| InsertQuery::builder().table("tags").build(),
            |tag: &Tag| {
                UpdateQuery::builder()
                    .table("tags")
                    .where_clause("id = ?")
                    .where_args([tag.id])
                    .build()
            },
            |tag: &Tag| ContentValues::new().with("id", tag.id).with("name", tag.name),
        )
    }

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .execute_batch("CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .unwrap();
        store
    }

    #[test]
    fn test_put_inserts_when_no_row_matches() {
        let store = store();
        let result = resolver()
            .perform_put(&store, &Tag { id: 7, name: "rust" })
            .unwrap();
        assert!(result.was_inserted());
        assert_eq!(result.inserted_id(), Some(7));
        assert!(result.affected_tables().contains("tags"));
    }

    #[test]
    fn test_put_updates_when_row_matches() {
        let store = store();
        let resolver = resolver();
        resolver.perform_put(&store, &Tag { id: 7, name: "rust" }).unwrap();

        let result = resolver
            .perform_put(&store, &Tag { id: 7, name: "sqlite" })
            .unwrap();
        assert!(!result.was_inserted());
        assert_eq!(result.rows_updated(), 1);

        let all = Query::builder().table("tags").build().unwrap();
        let rows = store.query(&all).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().unwrap().get_str("name").unwrap(), "sqlite");
    }

    #[test]
    fn test_lookup_without_selection_matches_whole_table() {
        let update = UpdateQuery::builder().table("tags").build().unwrap();
        let lookup = existing_rows_query(&update).unwrap();
        assert_eq!(lookup.table(), "tags");
        assert!(lookup.where_clause().is_none());
    }
}
