//! Schema Registry
//!
//! Caches one resolved [`SchemaDescriptor`] per record type. Resolution runs
//! outside the lock, so two threads racing on an unresolved type may both
//! build a descriptor; the first one stored wins and every caller receives
//! that shared instance.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, trace};

use crate::declaration::Declare;
use crate::error::MappingError;
use crate::resolver::resolve_declaration;
use crate::schema::SchemaDescriptor;

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

/// Hit and miss counters of a registry
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

/// Process-wide cache of resolved schemas
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<SchemaDescriptor>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// The registry used by record operations
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Resolve the schema of `T`, building and caching it on first use
    pub fn resolve<T: Declare>(&self) -> Result<Arc<SchemaDescriptor>, MappingError> {
        let type_id = TypeId::of::<T>();
        if let Some(schema) = self.get(type_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(type_name = %schema.type_name, "schema cache hit");
            return Ok(schema);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let built = Arc::new(resolve_declaration(&T::declaration())?);

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        let stored = schemas.entry(type_id).or_insert_with(|| {
            debug!(
                type_name = %built.type_name,
                entity = %built.entity_name,
                fields = built.fields.len(),
                "resolved schema"
            );
            built
        });
        Ok(Arc::clone(stored))
    }

    /// Cached schema for a type id, if resolved already
    pub fn get(&self, type_id: TypeId) -> Option<Arc<SchemaDescriptor>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    pub fn contains<T: Declare>(&self) -> bool {
        self.get(TypeId::of::<T>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached schemas sorted by type name
    pub fn schemas(&self) -> Vec<Arc<SchemaDescriptor>> {
        let mut schemas: Vec<_> = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        schemas.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        schemas
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    /// Drop every cached schema
    pub fn clear(&self) {
        self.schemas.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{Declaration, FieldMap};

    struct Tagged;

    impl Declare for Tagged {
        fn declaration() -> Declaration {
            Declaration::of::<Tagged>()
                .entity("tagged")
                .field::<i64>("id", FieldMap::new().primary_key())
        }
    }

    #[test]
    fn test_resolve_caches_instance() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());

        let first = registry.resolve::<Tagged>().unwrap();
        let second = registry.resolve::<Tagged>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.contains::<Tagged>());
        assert_eq!(
            registry.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                size: 1
            }
        );
    }

    #[test]
    fn test_clear() {
        let registry = SchemaRegistry::new();
        registry.resolve::<Tagged>().unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.stats().misses, 0);
    }
}
