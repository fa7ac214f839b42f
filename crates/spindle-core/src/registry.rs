//! Bindings from contract types to concrete components.
//!
//! A binding maps `(contract, qualifier)` to a concrete type together with
//! the function that builds it. Each slot is written at most once: the
//! check and the insert happen under the same map entry lock, so two
//! concurrent registrations for one slot cannot both succeed.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use spindle_common::error::{InjectError, Result};
use spindle_common::types::{Qualifier, TypeKey};

use crate::descriptor::Implements;
use crate::injector::{Injector, Request};
use crate::instance::Instance;

pub(crate) type BuildFn = fn(&Injector, &mut Request, &Qualifier) -> Result<Instance>;

/// A registered `(contract, qualifier) -> concrete` mapping.
#[derive(Clone, Copy)]
pub struct Binding {
    concrete: TypeKey,
    build: BuildFn,
}

impl Binding {
    /// Creates the binding of `T` as an implementation of `C`.
    pub(crate) fn of<C, T>() -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        Self {
            concrete: TypeKey::of::<T>(),
            build: build_bound::<C, T>,
        }
    }

    /// Concrete type behind the binding.
    #[must_use]
    pub const fn concrete(&self) -> TypeKey {
        self.concrete
    }

    pub(crate) fn build(&self, injector: &Injector, request: &mut Request, tag: &Qualifier) -> Result<Instance> {
        (self.build)(injector, request, tag)
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding").field("concrete", &self.concrete.name()).finish()
    }
}

/// Constructs `T` and registers it under `(C, tag)` before its fields are
/// injected, so a cycle routed through the same qualifier finds it.
fn build_bound<C, T>(injector: &Injector, request: &mut Request, tag: &Qualifier) -> Result<Instance>
where
    C: ?Sized + Send + Sync + 'static,
    T: Implements<C>,
{
    let contract = TypeKey::of::<C>();
    let register = |created: &Arc<T>| {
        let upcast = <T as Implements<C>>::upcast(Arc::clone(created));
        injector.cache().insert_qualified(contract, tag.clone(), Instance::new(upcast))
    };
    let built = injector.create::<T>(request, Some(&register))?;
    Ok(Instance::new(<T as Implements<C>>::upcast(built)))
}

/// Binding map plus the set of types pre-registered as singletons.
#[derive(Debug, Default)]
pub struct Registry {
    bindings: DashMap<(TypeKey, Qualifier), Binding>,
    singleton_classes: DashSet<TypeKey>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `(contract, tag)` to `binding`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateBinding`] if the slot is taken.
    pub fn bind(&self, contract: TypeKey, tag: Qualifier, binding: Binding) -> Result<()> {
        match self.bindings.entry((contract, tag)) {
            Entry::Occupied(slot) => Err(InjectError::DuplicateBinding {
                contract,
                qualifier: slot.key().1.clone(),
            }),
            Entry::Vacant(slot) => {
                let _ = slot.insert(binding);
                Ok(())
            }
        }
    }

    /// Returns the binding for `(contract, tag)`.
    #[must_use]
    pub fn binding(&self, contract: TypeKey, tag: &Qualifier) -> Option<Binding> {
        self.bindings
            .get(&(contract, tag.clone()))
            .map(|entry| *entry.value())
    }

    /// Marks `concrete` as singleton-eligible.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateSingleton`] if it was already marked.
    pub fn mark_singleton(&self, concrete: TypeKey) -> Result<()> {
        if self.singleton_classes.insert(concrete) {
            Ok(())
        } else {
            Err(InjectError::DuplicateSingleton { key: concrete })
        }
    }

    /// Returns `true` if `concrete` was pre-registered as a singleton.
    #[must_use]
    pub fn is_singleton_class(&self, concrete: TypeKey) -> bool {
        self.singleton_classes.contains(&concrete)
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}
