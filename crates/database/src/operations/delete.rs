//! Prepared deletes.

use crate::database::Database;
use crate::resolver::DeleteResolver;
use crate::results::{DeleteResult, DeleteResults};
use log::debug;
use ripple_core::descriptor::DeleteQuery;
use ripple_core::Result;
use std::sync::Arc;

fn resolve<T: 'static>(
    db: &Database,
    explicit: &Option<Arc<dyn DeleteResolver<T>>>,
) -> Result<Arc<dyn DeleteResolver<T>>> {
    match explicit {
        Some(resolver) => Ok(Arc::clone(resolver)),
        None => Ok(Arc::clone(db.type_mapping::<T>()?.delete_resolver())),
    }
}

fn delete_all<T>(
    db: &Database,
    resolver: &dyn DeleteResolver<T>,
    objects: Vec<T>,
) -> Result<Vec<(T, DeleteResult)>> {
    db.write(|store, touched| {
        let mut results = Vec::with_capacity(objects.len());
        for object in objects {
            let result = resolver.perform_delete(store, &object)?;
            touched.extend(result.changed_tables().cloned());
            results.push((object, result));
        }
        Ok(results)
    })
}

/// Entry point returned by [`Database::delete`].
pub struct PreparedDeleteBuilder {
    db: Database,
}

impl PreparedDeleteBuilder {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Deletes the rows a query selects.
    pub fn by_query(self, query: DeleteQuery) -> DeleteByQueryBuilder {
        DeleteByQueryBuilder { db: self.db, query }
    }

    /// Deletes one object.
    pub fn object<T>(self, object: T) -> DeleteObjectBuilder<T> {
        DeleteObjectBuilder {
            db: self.db,
            object,
            resolver: None,
        }
    }

    /// Deletes a collection of objects, atomically by default.
    pub fn objects<T>(self, objects: Vec<T>) -> DeleteObjectsBuilder<T> {
        DeleteObjectsBuilder {
            db: self.db,
            objects,
            resolver: None,
            use_transaction: true,
        }
    }
}

/// Builder for [`PreparedDeleteByQuery`].
pub struct DeleteByQueryBuilder {
    db: Database,
    query: DeleteQuery,
}

impl DeleteByQueryBuilder {
    /// Prepares the operation.
    pub fn prepare(self) -> PreparedDeleteByQuery {
        PreparedDeleteByQuery {
            db: self.db,
            query: self.query,
        }
    }
}

/// Deletes the rows a [`DeleteQuery`] selects.
pub struct PreparedDeleteByQuery {
    db: Database,
    query: DeleteQuery,
}

impl PreparedDeleteByQuery {
    /// Runs the delete on the calling thread and publishes the table if any
    /// row was removed.
    pub fn execute_blocking(&self) -> Result<DeleteResult> {
        self.db.write(|store, touched| {
            let rows_deleted = store.delete(&self.query)?;
            let result = DeleteResult::new(rows_deleted, self.query.affected_tables());
            touched.extend(result.changed_tables().cloned());
            Ok(result)
        })
    }
}

/// Builder for [`PreparedDeleteObject`].
pub struct DeleteObjectBuilder<T> {
    db: Database,
    object: T,
    resolver: Option<Arc<dyn DeleteResolver<T>>>,
}

impl<T: 'static> DeleteObjectBuilder<T> {
    /// Uses `resolver` instead of the registered type mapping.
    pub fn with_delete_resolver(mut self, resolver: impl DeleteResolver<T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Prepares the operation.
    pub fn prepare(self) -> PreparedDeleteObject<T> {
        PreparedDeleteObject {
            db: self.db,
            object: self.object,
            resolver: self.resolver,
        }
    }
}

/// Deletes one object.
pub struct PreparedDeleteObject<T> {
    db: Database,
    object: T,
    resolver: Option<Arc<dyn DeleteResolver<T>>>,
}

impl<T: 'static> PreparedDeleteObject<T> {
    /// Runs the delete on the calling thread and publishes the affected
    /// tables.
    pub fn execute_blocking(&self) -> Result<DeleteResult> {
        let resolver = resolve(&self.db, &self.resolver)?;
        self.db.write(|store, touched| {
            let result = resolver.perform_delete(store, &self.object)?;
            touched.extend(result.changed_tables().cloned());
            Ok(result)
        })
    }
}

/// Builder for [`PreparedDeleteObjects`].
pub struct DeleteObjectsBuilder<T> {
    db: Database,
    objects: Vec<T>,
    resolver: Option<Arc<dyn DeleteResolver<T>>>,
    use_transaction: bool,
}

impl<T: 'static> DeleteObjectsBuilder<T> {
    /// Uses `resolver` instead of the registered type mapping.
    pub fn with_delete_resolver(mut self, resolver: impl DeleteResolver<T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// With `true` (the default) the batch is all-or-nothing.
    pub fn use_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    /// Prepares the operation.
    pub fn prepare(self) -> PreparedDeleteObjects<T> {
        PreparedDeleteObjects {
            db: self.db,
            objects: self.objects,
            resolver: self.resolver,
            use_transaction: self.use_transaction,
        }
    }
}

/// Deletes a collection of objects and publishes one notification.
pub struct PreparedDeleteObjects<T> {
    db: Database,
    objects: Vec<T>,
    resolver: Option<Arc<dyn DeleteResolver<T>>>,
    use_transaction: bool,
}

impl<T: Clone + 'static> PreparedDeleteObjects<T> {
    /// Runs the batch on the calling thread. The results own copies of the
    /// objects, so the prepared batch can run again.
    pub fn execute_blocking(&self) -> Result<DeleteResults<T>> {
        let resolver = resolve(&self.db, &self.resolver)?;
        debug!(
            "delete {} objects (transaction: {})",
            self.objects.len(),
            self.use_transaction
        );

        let objects = self.objects.clone();
        let results = if self.use_transaction {
            self.db
                .transaction(|db| delete_all(db, resolver.as_ref(), objects))?
        } else {
            delete_all(&self.db, resolver.as_ref(), objects)?
        };
        Ok(DeleteResults::new(results))
    }
}
