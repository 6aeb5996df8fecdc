//! Type mapping registry with declared supertypes.
//!
//! Mappings are keyed by exact `TypeId`. A type without its own mapping can
//! still be resolved through a declared supertype: the supertype's resolvers
//! are adapted with the `upcast`/`narrow` conversions given at declaration.
//!
//! Resolution order for `T`:
//!
//! 1. the mapping registered for exactly `T`,
//! 2. each supertype declared for `T`, in declaration order, resolved
//!    recursively (depth-first); the first one that resolves wins,
//! 3. otherwise `ResolverNotFound`.

use crate::resolver::{DeleteResolver, GetResolver, PutResolver};
use crate::results::{DeleteResult, PutResult};
use crate::type_mapping::TypeMapping;
use hashbrown::{HashMap, HashSet};
use log::debug;
use parking_lot::RwLock;
use ripple_core::descriptor::{Query, RawQuery};
use ripple_core::{Error, Result, Row, RowSet};
use ripple_storage::Store;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

/// A `TypeMapping<T>` with its type erased.
type ErasedMapping = Arc<dyn Any + Send + Sync>;

/// Converts a supertype's erased mapping into the subtype's.
type Lift = Arc<dyn Fn(&ErasedMapping) -> Option<ErasedMapping> + Send + Sync>;

struct SupertypeEdge {
    supertype: TypeId,
    supertype_name: &'static str,
    lift: Lift,
}

#[derive(Default)]
struct RegistryState {
    mappings: HashMap<TypeId, ErasedMapping>,
    supertypes: HashMap<TypeId, Vec<SupertypeEdge>>,
}

impl RegistryState {
    fn find(&self, ty: TypeId, visited: &mut HashSet<TypeId>) -> Option<ErasedMapping> {
        if !visited.insert(ty) {
            return None;
        }
        if let Some(mapping) = self.mappings.get(&ty) {
            return Some(Arc::clone(mapping));
        }
        for edge in self.supertypes.get(&ty).into_iter().flatten() {
            if let Some(mapping) = self.find(edge.supertype, visited) {
                debug!("resolved through supertype {}", edge.supertype_name);
                return (edge.lift)(&mapping);
            }
        }
        None
    }
}

/// Per-database registry of type mappings.
///
/// Safe to use from several threads; registration takes a write lock,
/// resolution a read lock.
#[derive(Default)]
pub struct TypeMappingRegistry {
    state: RwLock<RegistryState>,
}

impl TypeMappingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the mapping for `T`, replacing any earlier one.
    pub fn register<T: 'static>(&self, mapping: TypeMapping<T>) {
        let replaced = self
            .state
            .write()
            .mappings
            .insert(TypeId::of::<T>(), Arc::new(mapping))
            .is_some();
        debug!(
            "type mapping for {} {}",
            type_name::<T>(),
            if replaced { "replaced" } else { "registered" }
        );
    }

    /// Declares `P` as a supertype of `S`.
    ///
    /// `upcast` turns an `S` into the `P` handed to `P`'s put and delete
    /// resolvers; `narrow` turns the `P` read by `P`'s get resolver into an
    /// `S`. Supertypes declared for the same `S` are tried in declaration
    /// order.
    pub fn declare_supertype<S, P, U, N>(&self, upcast: U, narrow: N)
    where
        S: 'static,
        P: 'static,
        U: Fn(&S) -> P + Send + Sync + 'static,
        N: Fn(P) -> S + Send + Sync + 'static,
    {
        let upcast: Arc<dyn Fn(&S) -> P + Send + Sync> = Arc::new(upcast);
        let narrow: Arc<dyn Fn(P) -> S + Send + Sync> = Arc::new(narrow);

        let lift: Lift = Arc::new(move |erased: &ErasedMapping| {
            let parent = erased.downcast_ref::<TypeMapping<P>>()?;
            let lifted = lift_mapping(parent, Arc::clone(&upcast), Arc::clone(&narrow));
            Some(Arc::new(lifted) as ErasedMapping)
        });

        self.state
            .write()
            .supertypes
            .entry(TypeId::of::<S>())
            .or_default()
            .push(SupertypeEdge {
                supertype: TypeId::of::<P>(),
                supertype_name: type_name::<P>(),
                lift,
            });
        debug!("{} declared as supertype of {}", type_name::<P>(), type_name::<S>());
    }

    /// Resolves the mapping for `T`.
    pub fn resolve<T: 'static>(&self) -> Result<TypeMapping<T>> {
        let state = self.state.read();
        let mut visited = HashSet::new();
        state
            .find(TypeId::of::<T>(), &mut visited)
            .and_then(|erased| erased.downcast_ref::<TypeMapping<T>>().cloned())
            .ok_or_else(|| Error::resolver_not_found(type_name::<T>()))
    }

    /// Returns true if a mapping is registered for exactly `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.state.read().mappings.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of directly registered mappings.
    pub fn len(&self) -> usize {
        self.state.read().mappings.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().mappings.is_empty()
    }
}

fn lift_mapping<S: 'static, P: 'static>(
    parent: &TypeMapping<P>,
    upcast: Arc<dyn Fn(&S) -> P + Send + Sync>,
    narrow: Arc<dyn Fn(P) -> S + Send + Sync>,
) -> TypeMapping<S> {
    TypeMapping::from_resolvers(
        Arc::new(NarrowingGet {
            inner: Arc::clone(parent.get_resolver()),
            narrow,
        }),
        Arc::new(UpcastingPut {
            inner: Arc::clone(parent.put_resolver()),
            upcast: Arc::clone(&upcast),
        }),
        Arc::new(UpcastingDelete {
            inner: Arc::clone(parent.delete_resolver()),
            upcast,
        }),
    )
}

struct NarrowingGet<S, P> {
    inner: Arc<dyn GetResolver<P>>,
    narrow: Arc<dyn Fn(P) -> S + Send + Sync>,
}

impl<S, P> GetResolver<S> for NarrowingGet<S, P> {
    fn map_from_row(&self, row: &Row) -> Result<S> {
        self.inner.map_from_row(row).map(|p| (self.narrow)(p))
    }

    fn perform_get(&self, store: &dyn Store, query: &Query) -> Result<RowSet> {
        self.inner.perform_get(store, query)
    }

    fn perform_raw_get(&self, store: &dyn Store, query: &RawQuery) -> Result<RowSet> {
        self.inner.perform_raw_get(store, query)
    }
}

struct UpcastingPut<S, P> {
    inner: Arc<dyn PutResolver<P>>,
    upcast: Arc<dyn Fn(&S) -> P + Send + Sync>,
}

impl<S, P> PutResolver<S> for UpcastingPut<S, P> {
    fn perform_put(&self, store: &dyn Store, object: &S) -> Result<PutResult> {
        self.inner.perform_put(store, &(self.upcast)(object))
    }
}

struct UpcastingDelete<S, P> {
    inner: Arc<dyn DeleteResolver<P>>,
    upcast: Arc<dyn Fn(&S) -> P + Send + Sync>,
}

impl<S, P> DeleteResolver<S> for UpcastingDelete<S, P> {
    fn perform_delete(&self, store: &dyn Store, object: &S) -> Result<DeleteResult> {
        self.inner.perform_delete(store, &(self.upcast)(object))
    }
}
