//! Injection metadata declared by component types.
//!
//! A type opts into construction by implementing [`Component`]: it lists
//! its constructors and injected fields as descriptors, plus the
//! qualifier tags and singleton marker that apply to the type as a whole.
//! The injector queries these descriptors instead of inspecting types at
//! runtime.

use std::sync::Arc;

use spindle_common::error::{BoxError, InjectError, Result};
use spindle_common::types::{Qualifier, TypeKey};

use crate::injector::{Injector, Request};
use crate::instance::{Inject, Instance};

/// A concrete type the injector can instantiate.
pub trait Component: Sized + Send + Sync + 'static {
    /// Declared constructors, in declaration order.
    fn constructors() -> Vec<Constructor<Self>>;

    /// Declared fields, in declaration order.
    fn fields() -> Vec<Field<Self>> {
        Vec::new()
    }

    /// Qualifier tags carried by the type.
    fn qualifiers() -> Vec<Qualifier> {
        Vec::new()
    }

    /// Whether the type carries the singleton marker.
    fn singleton() -> bool {
        false
    }
}

/// Upcast from a concrete component to a contract type it implements.
///
/// Usually written with [`implements!`](crate::implements).
pub trait Implements<C: ?Sized>: Component {
    /// Converts the shared concrete handle into a contract handle.
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

/// Implements [`Implements`] for each listed contract.
///
/// ```rust
/// use spindle_core::{implements, Component, Constructor};
///
/// trait Greeter: Send + Sync {}
///
/// struct English;
///
/// impl Greeter for English {}
///
/// impl Component for English {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new(|_| Ok(Self))]
///     }
/// }
///
/// implements!(English => dyn Greeter);
/// ```
#[macro_export]
macro_rules! implements {
    ($concrete:ty => $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $concrete {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

pub(crate) type FallbackFn = fn(&Injector, &mut Request) -> Result<Instance>;

/// What to do when no qualifier at an injection point matches.
#[derive(Clone, Copy)]
pub(crate) enum Fallback {
    /// Look up the unqualified cache, then construct the type.
    Construct(FallbackFn),
    /// Look up the unqualified cache only.
    CachedOnly,
}

fn construct_erased<T: Component>(injector: &Injector, request: &mut Request) -> Result<Instance> {
    injector.create::<T>(request, None).map(Instance::new)
}

/// A constructor parameter or field the injector must supply.
#[derive(Clone)]
pub struct Dependency {
    name: &'static str,
    target: TypeKey,
    qualifiers: Vec<Qualifier>,
    fallback: Fallback,
}

impl Dependency {
    /// Declares a dependency on a concrete component.
    ///
    /// Without a matching qualifier the component is taken from the
    /// unqualified cache or constructed.
    #[must_use]
    pub fn component<T: Component>(name: &'static str) -> Self {
        Self {
            name,
            target: TypeKey::of::<T>(),
            qualifiers: Vec::new(),
            fallback: Fallback::Construct(construct_erased::<T>),
        }
    }

    /// Declares a dependency on a type the injector never constructs itself.
    ///
    /// Contract types resolve through qualifiers or an instance already
    /// present in the unqualified cache.
    #[must_use]
    pub fn contract<C: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            target: TypeKey::of::<C>(),
            qualifiers: Vec::new(),
            fallback: Fallback::CachedOnly,
        }
    }

    /// Attaches a qualifier tag.
    #[must_use]
    pub fn qualified(mut self, tag: Qualifier) -> Self {
        self.qualifiers.push(tag);
        self
    }

    /// Parameter or field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Requested type.
    #[must_use]
    pub const fn target(&self) -> TypeKey {
        self.target
    }

    /// Qualifier tags attached to the injection point.
    #[must_use]
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    pub(crate) const fn fallback(&self) -> Fallback {
        self.fallback
    }
}

type Invoke<T> = Box<dyn Fn(&mut Arguments) -> std::result::Result<T, BoxError> + Send + Sync>;

/// A way to create `T` from resolved parameters.
///
/// A constructor is eligible for injection when it is accessible and it
/// either carries the inject marker or takes no parameters.
pub struct Constructor<T> {
    params: Vec<Dependency>,
    inject: bool,
    accessible: bool,
    invoke: Invoke<T>,
}

impl<T> Constructor<T> {
    /// Creates an accessible, unmarked constructor with no parameters.
    pub fn new<F>(invoke: F) -> Self
    where
        F: Fn(&mut Arguments) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            inject: false,
            accessible: true,
            invoke: Box::new(invoke),
        }
    }

    /// Adds the inject marker.
    #[must_use]
    pub const fn inject(mut self) -> Self {
        self.inject = true;
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, dependency: Dependency) -> Self {
        self.params.push(dependency);
        self
    }

    /// Marks the constructor as not accessible to the injector.
    #[must_use]
    pub const fn private(mut self) -> Self {
        self.accessible = false;
        self
    }

    /// Returns `true` if the injector may select this constructor.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.accessible && (self.inject || self.params.is_empty())
    }

    pub(crate) fn params(&self) -> &[Dependency] {
        &self.params
    }

    pub(crate) fn call(&self, args: &mut Arguments) -> std::result::Result<T, BoxError> {
        (self.invoke)(args)
    }
}

/// Resolved constructor parameters, consumed in declaration order.
#[derive(Debug)]
pub struct Arguments {
    owner: TypeKey,
    values: std::vec::IntoIter<(&'static str, Instance)>,
}

impl Arguments {
    pub(crate) fn new(owner: TypeKey, values: Vec<(&'static str, Instance)>) -> Self {
        Self {
            owner,
            values: values.into_iter(),
        }
    }

    /// Takes the next parameter as `Arc<D>`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::MissingDependency`] when the parameters are
    /// exhausted or the next one is not a `D`.
    pub fn take<D: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<D>> {
        let (point, value) = self
            .values
            .next()
            .ok_or(InjectError::MissingDependency {
                point: "<unnamed>",
                owner: self.owner,
            })?;
        value.downcast::<D>().ok_or(InjectError::MissingDependency {
            point,
            owner: self.owner,
        })
    }
}

type Assign<T> = Box<dyn Fn(&T, Instance) -> Result<()> + Send + Sync>;

/// An injectable field of `T`.
///
/// Eligible when it carries the inject marker and is accessible.
pub struct Field<T> {
    point: Dependency,
    inject: bool,
    accessible: bool,
    assign: Assign<T>,
}

impl<T: 'static> Field<T> {
    /// Declares a field holding a concrete component.
    #[must_use]
    pub fn component<D: Component>(name: &'static str, slot: fn(&T) -> &Inject<D>) -> Self {
        Self::with_slot(Dependency::component::<D>(name), slot)
    }

    /// Declares a field holding a contract type.
    #[must_use]
    pub fn contract<D: ?Sized + Send + Sync + 'static>(
        name: &'static str,
        slot: fn(&T) -> &Inject<D>,
    ) -> Self {
        Self::with_slot(Dependency::contract::<D>(name), slot)
    }

    fn with_slot<D: ?Sized + Send + Sync + 'static>(
        point: Dependency,
        slot: fn(&T) -> &Inject<D>,
    ) -> Self {
        let name = point.name();
        Self {
            point,
            inject: true,
            accessible: true,
            assign: Box::new(move |owner: &T, value: Instance| {
                let value = value
                    .downcast::<D>()
                    .ok_or(InjectError::MissingDependency {
                        point: name,
                        owner: TypeKey::of::<T>(),
                    })?;
                if !slot(owner).fill(value) {
                    tracing::trace!(field = name, "field already populated, keeping existing value");
                }
                Ok(())
            }),
        }
    }

    /// Attaches a qualifier tag.
    #[must_use]
    pub fn qualified(mut self, tag: Qualifier) -> Self {
        self.point = self.point.qualified(tag);
        self
    }

    /// Removes the inject marker; the field is declared but left alone.
    #[must_use]
    pub const fn unmarked(mut self) -> Self {
        self.inject = false;
        self
    }

    /// Marks the field as not accessible to the injector.
    #[must_use]
    pub const fn private(mut self) -> Self {
        self.accessible = false;
        self
    }

    /// Returns `true` if the injector will populate this field.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.inject && self.accessible
    }

    pub(crate) const fn point(&self) -> &Dependency {
        &self.point
    }

    pub(crate) fn assign(&self, owner: &T, value: Instance) -> Result<()> {
        (self.assign)(owner, value)
    }
}
