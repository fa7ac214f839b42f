//! Fluent API for configuring an injector before use.

use std::sync::Arc;

use spindle_common::config::InjectorConfig;
use spindle_common::error::Result;
use spindle_common::types::Qualifier;

use crate::descriptor::{Component, Implements};
use crate::injector::Injector;

type Step = Box<dyn FnOnce(&Injector) -> Result<()>>;

/// Builder collecting configuration and registrations.
///
/// Registrations are applied in the order they were added when
/// [`build`](Self::build) runs; the first failure aborts the build.
pub struct InjectorBuilder {
    config: InjectorConfig,
    steps: Vec<Step>,
}

impl InjectorBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: InjectorConfig::default(),
            steps: Vec::new(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: InjectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the label used in log records.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = label.into();
        self
    }

    /// Limits how deeply constructions may nest within one request.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Binds `T` to contract `C` under `T`'s own qualifier.
    #[must_use]
    pub fn bind<C, T>(self) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.step(|injector| injector.register_binding::<C, T>().map(drop))
    }

    /// Binds `T` to contract `C` under `tag`.
    #[must_use]
    pub fn bind_qualified<C, T>(self, tag: Qualifier) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
    {
        self.step(move |injector| injector.register_qualified_binding::<C, T>(tag).map(drop))
    }

    /// Registers a pre-built instance of contract `C` under `tag`.
    #[must_use]
    pub fn qualified_instance<C>(self, tag: Qualifier, instance: Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.step(move |injector| {
            injector
                .register_qualified_instance::<C>(tag, instance)
                .map(drop)
        })
    }

    /// Registers a pre-built unqualified instance.
    #[must_use]
    pub fn singleton<T>(self, instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.step(move |injector| injector.register_singleton::<T>(instance).map(drop))
    }

    /// Marks `T` as singleton-eligible.
    #[must_use]
    pub fn singleton_class<T: Component>(self) -> Self {
        self.step(|injector| injector.register_singleton_class::<T>().map(drop))
    }

    fn step(mut self, step: impl FnOnce(&Injector) -> Result<()> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Validates the configuration, creates the injector, and applies
    /// every registration.
    ///
    /// # Errors
    ///
    /// Returns the configuration error or the first registration error.
    pub fn build(self) -> Result<Arc<Injector>> {
        self.config.validate()?;
        let injector = Injector::with_config(self.config);
        tracing::debug!(injector = %injector.id(), steps = self.steps.len(), "applying registrations");
        for step in self.steps {
            step(&injector)?;
        }
        Ok(injector)
    }
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InjectorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectorBuilder")
            .field("config", &self.config)
            .field("steps", &self.steps.len())
            .finish()
    }
}
