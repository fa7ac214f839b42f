//! # spindle-core
//!
//! A minimal dependency-injection container.
//!
//! Given a set of registrations, the [`Injector`] constructs object graphs
//! automatically: constructor parameters and fields are resolved by declared
//! type and optional [`Qualifier`] tags, singleton-eligible instances are
//! cached, and reference cycles are broken by caching an instance before
//! its fields are injected.
//!
//! - **Descriptors**: [`Component`], [`Constructor`], [`Field`], and
//!   [`Dependency`] declare what a type needs.
//! - **Registry**: `(contract, qualifier) -> concrete` bindings.
//! - **Cache**: unqualified singletons and qualified instances.
//! - **Injector**: resolution and the construction protocol.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use spindle_core::{Component, Constructor, Dependency, Injector};
//!
//! struct Clock;
//!
//! impl Component for Clock {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|_| Ok(Self))]
//!     }
//!
//!     fn singleton() -> bool {
//!         true
//!     }
//! }
//!
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! impl Component for Scheduler {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![
//!             Constructor::new(|args| Ok(Self { clock: args.take::<Clock>()? }))
//!                 .inject()
//!                 .param(Dependency::component::<Clock>("clock")),
//!         ]
//!     }
//! }
//!
//! let injector = Injector::new();
//! let scheduler = injector.get_instance::<Scheduler>()?;
//! let clock = injector.get_instance::<Clock>()?;
//! assert!(Arc::ptr_eq(&scheduler.clock, &clock));
//! # Ok::<(), spindle_core::InjectError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod builder;
pub mod cache;
pub mod descriptor;
pub mod injector;
pub mod instance;
pub mod registry;

pub use builder::InjectorBuilder;
pub use descriptor::{Arguments, Component, Constructor, Dependency, Field, Implements};
pub use injector::Injector;
pub use instance::{Inject, Instance};
pub use spindle_common::error::{AmbiguitySource, InjectError, Result};
pub use spindle_common::types::{Qualifier, TypeKey};
