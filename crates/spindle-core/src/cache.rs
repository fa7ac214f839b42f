//! Instance cache: unqualified singletons and qualified instances.
//!
//! Slots are populated monotonically. Nothing is evicted or replaced for
//! the lifetime of the injector.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use spindle_common::error::{InjectError, Result};
use spindle_common::types::{Qualifier, TypeKey};

use crate::instance::Instance;

/// Holds every instance the injector has cached.
#[derive(Debug, Default)]
pub struct InstanceCache {
    singletons: DashMap<TypeKey, Instance>,
    qualified: DashMap<(TypeKey, Qualifier), Instance>,
}

impl InstanceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the unqualified instance cached for `key`.
    #[must_use]
    pub fn singleton(&self, key: TypeKey) -> Option<Instance> {
        self.singletons.get(&key).map(|entry| entry.value().clone())
    }

    /// Registers a pre-built unqualified instance.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateSingleton`] if the slot is taken.
    pub fn insert_singleton(&self, key: TypeKey, instance: Instance) -> Result<()> {
        match self.singletons.entry(key) {
            Entry::Occupied(_) => Err(InjectError::DuplicateSingleton { key }),
            Entry::Vacant(slot) => {
                let _ = slot.insert(instance);
                Ok(())
            }
        }
    }

    /// Caches a freshly constructed singleton.
    ///
    /// The first writer wins: returns whichever instance occupies the
    /// slot afterwards, which is `instance` unless another thread cached
    /// one first.
    pub fn cache_singleton(&self, key: TypeKey, instance: Instance) -> Instance {
        self.singletons.entry(key).or_insert(instance).value().clone()
    }

    /// Returns the instance registered under `(contract, tag)`.
    #[must_use]
    pub fn qualified(&self, contract: TypeKey, tag: &Qualifier) -> Option<Instance> {
        self.qualified
            .get(&(contract, tag.clone()))
            .map(|entry| entry.value().clone())
    }

    /// Registers an instance under `(contract, tag)`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateQualifiedInstance`] if the slot is taken.
    pub fn insert_qualified(&self, contract: TypeKey, tag: Qualifier, instance: Instance) -> Result<()> {
        match self.qualified.entry((contract, tag)) {
            Entry::Occupied(slot) => Err(InjectError::DuplicateQualifiedInstance {
                contract,
                qualifier: slot.key().1.clone(),
            }),
            Entry::Vacant(slot) => {
                let _ = slot.insert(instance);
                Ok(())
            }
        }
    }

    /// Number of cached unqualified instances.
    #[must_use]
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    /// Number of cached qualified instances.
    #[must_use]
    pub fn qualified_count(&self) -> usize {
        self.qualified.len()
    }
}
