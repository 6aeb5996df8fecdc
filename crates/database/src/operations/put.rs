//! Prepared insert-or-update operations.

use crate::database::Database;
use crate::resolver::PutResolver;
use crate::results::{PutResult, PutResults};
use log::debug;
use ripple_core::{ContentValues, Error, Result};
use std::sync::Arc;

fn resolve<T: 'static>(
    db: &Database,
    explicit: &Option<Arc<dyn PutResolver<T>>>,
) -> Result<Arc<dyn PutResolver<T>>> {
    match explicit {
        Some(resolver) => Ok(Arc::clone(resolver)),
        None => Ok(Arc::clone(db.type_mapping::<T>()?.put_resolver())),
    }
}

fn put_one<T>(db: &Database, resolver: &dyn PutResolver<T>, object: &T) -> Result<PutResult> {
    db.write(|store, touched| {
        let result = resolver.perform_put(store, object)?;
        touched.extend(result.changed_tables().cloned());
        Ok(result)
    })
}

/// Applies every put under one write lock. Tables touched before a failure
/// are still published.
fn put_all<T>(
    db: &Database,
    resolver: &dyn PutResolver<T>,
    objects: Vec<T>,
) -> Result<Vec<(T, PutResult)>> {
    db.write(|store, touched| {
        let mut results = Vec::with_capacity(objects.len());
        for object in objects {
            let result = resolver.perform_put(store, &object)?;
            touched.extend(result.changed_tables().cloned());
            results.push((object, result));
        }
        Ok(results)
    })
}

/// Entry point returned by [`Database::put`].
pub struct PreparedPutBuilder {
    db: Database,
}

impl PreparedPutBuilder {
    pub(crate) fn new(db: Database) -> Self {
        Self { db }
    }

    /// Puts one object.
    pub fn object<T>(self, object: T) -> PutObjectBuilder<T> {
        PutObjectBuilder {
            db: self.db,
            object,
            resolver: None,
        }
    }

    /// Puts a collection of objects, atomically by default.
    pub fn objects<T>(self, objects: Vec<T>) -> PutObjectsBuilder<T> {
        PutObjectsBuilder {
            db: self.db,
            objects,
            resolver: None,
            use_transaction: true,
        }
    }

    /// Puts raw column values. Needs an explicit resolver.
    pub fn content_values(self, values: ContentValues) -> PutContentValuesBuilder {
        PutContentValuesBuilder {
            db: self.db,
            values,
            resolver: None,
        }
    }
}

/// Builder for [`PreparedPutObject`].
pub struct PutObjectBuilder<T> {
    db: Database,
    object: T,
    resolver: Option<Arc<dyn PutResolver<T>>>,
}

impl<T: 'static> PutObjectBuilder<T> {
    /// Uses `resolver` instead of the registered type mapping.
    pub fn with_put_resolver(mut self, resolver: impl PutResolver<T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Prepares the operation.
    pub fn prepare(self) -> PreparedPutObject<T> {
        PreparedPutObject {
            db: self.db,
            object: self.object,
            resolver: self.resolver,
        }
    }
}

/// Puts one object.
pub struct PreparedPutObject<T> {
    db: Database,
    object: T,
    resolver: Option<Arc<dyn PutResolver<T>>>,
}

impl<T: 'static> PreparedPutObject<T> {
    /// Runs the put on the calling thread and publishes the affected tables.
    pub fn execute_blocking(&self) -> Result<PutResult> {
        let resolver = resolve(&self.db, &self.resolver)?;
        put_one(&self.db, resolver.as_ref(), &self.object)
    }
}

/// Builder for [`PreparedPutObjects`].
pub struct PutObjectsBuilder<T> {
    db: Database,
    objects: Vec<T>,
    resolver: Option<Arc<dyn PutResolver<T>>>,
    use_transaction: bool,
}

impl<T: 'static> PutObjectsBuilder<T> {
    /// Uses `resolver` instead of the registered type mapping.
    pub fn with_put_resolver(mut self, resolver: impl PutResolver<T> + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// With `true` (the default) the batch is all-or-nothing. With `false`
    /// objects are applied one by one and a failure keeps the earlier ones.
    pub fn use_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    /// Prepares the operation.
    pub fn prepare(self) -> PreparedPutObjects<T> {
        PreparedPutObjects {
            db: self.db,
            objects: self.objects,
            resolver: self.resolver,
            use_transaction: self.use_transaction,
        }
    }
}

/// Puts a collection of objects and publishes one notification.
pub struct PreparedPutObjects<T> {
    db: Database,
    objects: Vec<T>,
    resolver: Option<Arc<dyn PutResolver<T>>>,
    use_transaction: bool,
}

impl<T: Clone + 'static> PreparedPutObjects<T> {
    /// Runs the batch on the calling thread. The results own copies of the
    /// objects, so the prepared batch can run again.
    pub fn execute_blocking(&self) -> Result<PutResults<T>> {
        let resolver = resolve(&self.db, &self.resolver)?;
        debug!(
            "put {} objects (transaction: {})",
            self.objects.len(),
            self.use_transaction
        );

        let objects = self.objects.clone();
        let results = if self.use_transaction {
            self.db
                .transaction(|db| put_all(db, resolver.as_ref(), objects))?
        } else {
            put_all(&self.db, resolver.as_ref(), objects)?
        };
        Ok(PutResults::new(results))
    }
}

/// Builder for [`PreparedPutContentValues`].
pub struct PutContentValuesBuilder {
    db: Database,
    values: ContentValues,
    resolver: Option<Arc<dyn PutResolver<ContentValues>>>,
}

impl PutContentValuesBuilder {
    /// Sets the resolver. Required.
    pub fn with_put_resolver(
        mut self,
        resolver: impl PutResolver<ContentValues> + 'static,
    ) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Fails with `IllegalArgument` if no resolver was given.
    pub fn prepare(self) -> Result<PreparedPutContentValues> {
        let resolver = self
            .resolver
            .ok_or_else(|| Error::illegal_argument("Please specify put resolver"))?;
        Ok(PreparedPutContentValues {
            db: self.db,
            values: self.values,
            resolver,
        })
    }
}

/// Puts raw column values.
pub struct PreparedPutContentValues {
    db: Database,
    values: ContentValues,
    resolver: Arc<dyn PutResolver<ContentValues>>,
}

impl PreparedPutContentValues {
    /// Runs the put on the calling thread and publishes the affected tables.
    pub fn execute_blocking(&self) -> Result<PutResult> {
        put_one(&self.db, self.resolver.as_ref(), &self.values)
    }
}
