//! The injector: registration API, qualifier-aware resolution, and the
//! per-instance construction protocol.
//!
//! Resolution is a synchronous depth-first descent on the calling thread.
//! Building one instance runs these steps in order:
//!
//! 1. select the single eligible constructor,
//! 2. resolve its parameters in declaration order,
//! 3. invoke it,
//! 4. cache the instance if it is singleton-eligible,
//! 5. run the caller's post-create hook (qualified registration),
//! 6. inject eligible fields in declaration order.
//!
//! Steps 4 and 5 happen before field injection. A field that transitively
//! asks for the instance under construction therefore receives the cached,
//! not yet fully populated, instance instead of recursing forever.

use std::sync::{Arc, Weak};

use spindle_common::config::InjectorConfig;
use spindle_common::error::{AmbiguitySource, InjectError, Result};
use spindle_common::types::{InjectorId, Qualifier, TypeKey};

use crate::builder::InjectorBuilder;
use crate::cache::InstanceCache;
use crate::descriptor::{Arguments, Component, Constructor, Dependency, Fallback, Implements};
use crate::instance::Instance;
use crate::registry::{Binding, Registry};

/// Hook run on a freshly constructed instance before its fields are injected.
pub(crate) type PostCreate<'a, T> = &'a dyn Fn(&Arc<T>) -> Result<()>;

/// State carried through one top-level request.
#[derive(Debug, Default)]
pub(crate) struct Request {
    depth: usize,
}

/// A dependency-injection container.
///
/// Each injector owns its registry and instance cache; several injectors
/// can coexist without sharing state. The injector is always handed out
/// as an `Arc` and is resolvable as a dependency of type `Injector`.
pub struct Injector {
    id: InjectorId,
    config: InjectorConfig,
    registry: Registry,
    cache: InstanceCache,
    this: Weak<Self>,
}

impl Injector {
    /// Creates an injector with the default configuration.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_config(InjectorConfig::default())
    }

    /// Creates an injector with the given configuration.
    #[must_use]
    pub fn with_config(config: InjectorConfig) -> Arc<Self> {
        let injector = Arc::new_cyclic(|this| Self {
            id: InjectorId::generate(),
            config,
            registry: Registry::new(),
            cache: InstanceCache::new(),
            this: this.clone(),
        });
        tracing::debug!(injector = %injector.id, label = %injector.config.label, "injector created");
        injector
    }

    /// Returns a builder for a configured injector.
    #[must_use]
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    /// Unique identifier of this injector.
    #[must_use]
    pub const fn id(&self) -> &InjectorId {
        &self.id
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// Binding registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instance cache.
    #[must_use]
    pub const fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    // ── Registration ──

    /// Binds `T` as the implementation of contract `C` under `T`'s own
    /// qualifier tag.
    ///
    /// The first tag returned by [`Component::qualifiers`] is used.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::MissingQualifier`] if `T` carries no tag and
    /// [`InjectError::DuplicateBinding`] if the slot is already bound.
    pub fn register_binding<C, T>(&self) -> Result<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        let tag = T::qualifiers()
            .into_iter()
            .next()
            .ok_or(InjectError::MissingQualifier {
                concrete: TypeKey::of::<T>(),
            })?;
        self.register_qualified_binding::<C, T>(tag)
    }

    /// Binds `T` as the implementation of contract `C` under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateBinding`] if the slot is already bound.
    pub fn register_qualified_binding<C, T>(&self, tag: Qualifier) -> Result<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        let contract = TypeKey::of::<C>();
        tracing::debug!(
            injector = %self.id,
            contract = contract.name(),
            concrete = std::any::type_name::<T>(),
            qualifier = %tag,
            "registering binding"
        );
        self.registry.bind(contract, tag, Binding::of::<C, T>())?;
        Ok(self)
    }

    /// Registers a pre-built instance of contract `C` under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateQualifiedInstance`] if the slot is
    /// already populated.
    pub fn register_qualified_instance<C>(&self, tag: Qualifier, instance: Arc<C>) -> Result<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let contract = TypeKey::of::<C>();
        tracing::debug!(injector = %self.id, contract = contract.name(), qualifier = %tag, "registering qualified instance");
        self.cache.insert_qualified(contract, tag, Instance::new(instance))?;
        Ok(self)
    }

    /// Registers a pre-built unqualified instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateSingleton`] if `T` already has one,
    /// which is always the case for `Injector` itself.
    pub fn register_singleton<T>(&self, instance: Arc<T>) -> Result<&Self>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        if key == TypeKey::of::<Self>() {
            return Err(InjectError::DuplicateSingleton { key });
        }
        tracing::debug!(injector = %self.id, key = key.name(), "registering singleton instance");
        self.cache.insert_singleton(key, Instance::new(instance))?;
        Ok(self)
    }

    /// Marks `T` as singleton-eligible even without its own marker.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::DuplicateSingleton`] if `T` was already marked.
    pub fn register_singleton_class<T: Component>(&self) -> Result<&Self> {
        let key = TypeKey::of::<T>();
        tracing::debug!(injector = %self.id, key = key.name(), "registering singleton class");
        self.registry.mark_singleton(key)?;
        Ok(self)
    }

    // ── Resolution ──

    /// Returns an instance of `T`, constructing it and its dependencies
    /// as needed.
    ///
    /// # Errors
    ///
    /// Returns the first error raised anywhere in the object graph.
    pub fn get_instance<T: Component>(&self) -> Result<Arc<T>> {
        self.create::<T>(&mut Request::default(), None)
    }

    /// Resolves contract `C` through the qualifier `tag`, falling back to
    /// an unqualified cached instance.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::NoEligibleConstructor`] if nothing is
    /// registered for `C` under `tag` and no unqualified instance exists.
    pub fn get_qualified<C>(&self, tag: Qualifier) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let point = Dependency::contract::<C>("<request>").qualified(tag);
        let owner = TypeKey::of::<Self>();
        let instance = self.resolve_point(&point, owner, &mut Request::default())?;
        typed::<C>(&instance, point.name(), owner)
    }

    /// Returns the unqualified cached instance of `C` without constructing
    /// anything. Requesting `Injector` returns this container.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::NoEligibleConstructor`] if nothing is cached
    /// for `C`.
    pub fn get_cached<C>(&self) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<C>();
        let hit = self
            .cached(key)
            .ok_or(InjectError::NoEligibleConstructor { concrete: key })?;
        typed::<C>(&hit, "<cached>", TypeKey::of::<Self>())
    }

    /// Injects the eligible fields of an instance the caller constructed.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while resolving a field.
    pub fn inject_members<T: Component>(&self, target: &T) -> Result<()> {
        self.inject_fields(target, &mut Request::default())
    }

    pub(crate) fn create<T: Component>(
        &self,
        request: &mut Request,
        on_created: Option<PostCreate<'_, T>>,
    ) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        if let Some(hit) = self.cached(key) {
            tracing::trace!(injector = %self.id, key = key.name(), "singleton cache hit");
            return typed::<T>(&hit, "<cached>", key);
        }

        request.depth += 1;
        if let Some(limit) = self.config.max_depth {
            if request.depth > limit {
                request.depth -= 1;
                return Err(InjectError::DepthExceeded {
                    limit,
                    concrete: key,
                });
            }
        }
        let built = self.construct::<T>(request, on_created);
        request.depth -= 1;
        built
    }

    fn construct<T: Component>(
        &self,
        request: &mut Request,
        on_created: Option<PostCreate<'_, T>>,
    ) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let constructor = select_constructor::<T>()?;
        tracing::trace!(
            injector = %self.id,
            key = key.name(),
            params = constructor.params().len(),
            depth = request.depth,
            "constructing"
        );

        let mut values = Vec::with_capacity(constructor.params().len());
        for param in constructor.params() {
            values.push((param.name(), self.resolve_point(param, key, request)?));
        }
        let value = constructor
            .call(&mut Arguments::new(key, values))
            .map_err(|e| match e.downcast::<InjectError>() {
                Ok(inner) => *inner,
                Err(source) => InjectError::ConstructionFailed {
                    concrete: key,
                    source,
                },
            })?;
        let target = Arc::new(value);

        if T::singleton() || self.registry.is_singleton_class(key) {
            let fresh = Instance::new(Arc::clone(&target));
            let winner = self.cache.cache_singleton(key, fresh.clone());
            if !winner.ptr_eq(&fresh) {
                tracing::debug!(injector = %self.id, key = key.name(), "singleton cached concurrently, discarding duplicate");
                return typed::<T>(&winner, "<cached>", key);
            }
            tracing::debug!(injector = %self.id, key = key.name(), "singleton cached");
        }

        if let Some(hook) = on_created {
            hook(&target)?;
        }

        self.inject_fields(target.as_ref(), request)?;
        Ok(target)
    }

    fn inject_fields<T: Component>(&self, target: &T, request: &mut Request) -> Result<()> {
        let owner = TypeKey::of::<T>();
        for field in T::fields().iter().filter(|f| f.is_eligible()) {
            let value = self.resolve_point(field.point(), owner, request)?;
            field.assign(target, value)?;
        }
        Ok(())
    }

    /// Resolves one injection point: qualified lookup first, then the
    /// unqualified fallback.
    fn resolve_point(&self, point: &Dependency, owner: TypeKey, request: &mut Request) -> Result<Instance> {
        if let Some(found) = self.resolve_qualified(point, owner, request)? {
            return Ok(found);
        }
        match point.fallback() {
            Fallback::Construct(build) => build(self, request),
            Fallback::CachedOnly => self.cached(point.target()).ok_or(InjectError::NoEligibleConstructor {
                concrete: point.target(),
            }),
        }
    }

    /// Qualified instances win over qualified bindings so that an instance
    /// registered earlier in a cyclic resolution is reused, not rebuilt.
    fn resolve_qualified(
        &self,
        point: &Dependency,
        owner: TypeKey,
        request: &mut Request,
    ) -> Result<Option<Instance>> {
        if point.qualifiers().is_empty() {
            return Ok(None);
        }
        let target = point.target();
        let ambiguous = |source_kind| InjectError::AmbiguousQualifier {
            target,
            point: point.name(),
            owner,
            source_kind,
        };

        let mut instances: Vec<Instance> = Vec::new();
        for tag in point.qualifiers() {
            if let Some(hit) = self.cache.qualified(target, tag) {
                if !instances.iter().any(|seen| seen.ptr_eq(&hit)) {
                    instances.push(hit);
                }
            }
        }
        if instances.len() > 1 {
            return Err(ambiguous(AmbiguitySource::Instances));
        }
        if let Some(hit) = instances.pop() {
            tracing::trace!(injector = %self.id, target = target.name(), "qualified instance hit");
            return Ok(Some(hit));
        }

        let mut bindings: Vec<(&Qualifier, Binding)> = Vec::new();
        for tag in point.qualifiers() {
            if let Some(bound) = self.registry.binding(target, tag) {
                if !bindings.iter().any(|(_, seen)| seen.concrete() == bound.concrete()) {
                    bindings.push((tag, bound));
                }
            }
        }
        if bindings.len() > 1 {
            return Err(ambiguous(AmbiguitySource::Bindings));
        }
        match bindings.pop() {
            Some((tag, bound)) => {
                tracing::trace!(
                    injector = %self.id,
                    target = target.name(),
                    concrete = bound.concrete().name(),
                    qualifier = %tag,
                    "qualified binding hit"
                );
                bound.build(self, request, tag).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Unqualified cache lookup; the injector itself always hits.
    fn cached(&self, key: TypeKey) -> Option<Instance> {
        if key == TypeKey::of::<Self>() {
            return self.this.upgrade().map(Instance::new);
        }
        self.cache.singleton(key)
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.id)
            .field("label", &self.config.label)
            .field("bindings", &self.registry.binding_count())
            .field("singletons", &self.cache.singleton_count())
            .field("qualified", &self.cache.qualified_count())
            .finish_non_exhaustive()
    }
}

fn select_constructor<T: Component>() -> Result<Constructor<T>> {
    let concrete = TypeKey::of::<T>();
    let mut eligible: Vec<Constructor<T>> = T::constructors()
        .into_iter()
        .filter(Constructor::is_eligible)
        .collect();
    match eligible.len() {
        0 => Err(InjectError::NoEligibleConstructor { concrete }),
        1 => eligible.pop().ok_or(InjectError::NoEligibleConstructor { concrete }),
        count => Err(InjectError::AmbiguousConstructor { concrete, count }),
    }
}

fn typed<T: ?Sized + Send + Sync + 'static>(
    instance: &Instance,
    point: &'static str,
    owner: TypeKey,
) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .ok_or(InjectError::MissingDependency { point, owner })
}
