//! Binding of one resolver of each kind to a type.

use crate::resolver::{DeleteResolver, GetResolver, PutResolver};
use ripple_core::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// The resolver triple for type `T`.
///
/// Cloning shares the resolvers.
pub struct TypeMapping<T> {
    get: Arc<dyn GetResolver<T>>,
    put: Arc<dyn PutResolver<T>>,
    delete: Arc<dyn DeleteResolver<T>>,
}

impl<T> Clone for TypeMapping<T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            put: Arc::clone(&self.put),
            delete: Arc::clone(&self.delete),
        }
    }
}

impl<T> fmt::Debug for TypeMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapping")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> TypeMapping<T> {
    /// Creates a builder.
    pub fn builder() -> TypeMappingBuilder<T> {
        TypeMappingBuilder {
            get: None,
            put: None,
            delete: None,
        }
    }

    /// Creates a mapping from already shared resolvers.
    pub fn from_resolvers(
        get: Arc<dyn GetResolver<T>>,
        put: Arc<dyn PutResolver<T>>,
        delete: Arc<dyn DeleteResolver<T>>,
    ) -> Self {
        Self { get, put, delete }
    }

    /// Returns the get resolver.
    pub fn get_resolver(&self) -> &Arc<dyn GetResolver<T>> {
        &self.get
    }

    /// Returns the put resolver.
    pub fn put_resolver(&self) -> &Arc<dyn PutResolver<T>> {
        &self.put
    }

    /// Returns the delete resolver.
    pub fn delete_resolver(&self) -> &Arc<dyn DeleteResolver<T>> {
        &self.delete
    }
}

/// Builder for [`TypeMapping`]. All three resolvers are required.
pub struct TypeMappingBuilder<T> {
    get: Option<Arc<dyn GetResolver<T>>>,
    put: Option<Arc<dyn PutResolver<T>>>,
    delete: Option<Arc<dyn DeleteResolver<T>>>,
}

impl<T> TypeMappingBuilder<T> {
    /// Sets the get resolver.
    pub fn get_resolver(mut self, resolver: impl GetResolver<T> + 'static) -> Self {
        self.get = Some(Arc::new(resolver));
        self
    }

    /// Sets the put resolver.
    pub fn put_resolver(mut self, resolver: impl PutResolver<T> + 'static) -> Self {
        self.put = Some(Arc::new(resolver));
        self
    }

    /// Sets the delete resolver.
    pub fn delete_resolver(mut self, resolver: impl DeleteResolver<T> + 'static) -> Self {
        self.delete = Some(Arc::new(resolver));
        self
    }

    /// Builds the mapping.
    pub fn build(self) -> Result<TypeMapping<T>> {
        let get = self
            .get
            .ok_or_else(|| Error::illegal_argument("Please specify get resolver"))?;
        let put = self
            .put
            .ok_or_else(|| Error::illegal_argument("Please specify put resolver"))?;
        let delete = self
            .delete
            .ok_or_else(|| Error::illegal_argument("Please specify delete resolver"))?;
        Ok(TypeMapping { get, put, delete })
    }
}
