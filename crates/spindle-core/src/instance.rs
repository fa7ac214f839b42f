//! Shared instance handles.
//!
//! Resolution hands out `Arc`s so a dependency can hold on to an object
//! whose own fields are still being populated. Fields use [`Inject`], a
//! write-once slot, so population happens through a shared reference
//! after the owner has been cached.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use spindle_common::types::TypeKey;

/// Type-erased shared handle to a resolved value.
///
/// Identity is the address of the pointee, so an `Arc<NodeA>` and the
/// `Arc<dyn Node>` upcast from it compare equal with [`ptr_eq`](Self::ptr_eq).
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    addr: usize,
    key: TypeKey,
}

impl Instance {
    /// Wraps a shared value.
    #[must_use]
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        let addr = Arc::as_ptr(&value).cast::<()>().addr();
        Self {
            value: Arc::new(value),
            addr,
            key: TypeKey::of::<T>(),
        }
    }

    /// Returns the handle as `Arc<T>` if it was created from one.
    #[must_use]
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Returns `true` if both handles point at the same object.
    #[must_use]
    pub const fn ptr_eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }

    /// Returns the type this handle was created as.
    #[must_use]
    pub const fn type_key(&self) -> TypeKey {
        self.key
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.key.name())
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}

/// Write-once slot for an injected field.
///
/// Empty until the injector populates it. A populated slot is never
/// replaced.
pub struct Inject<T: ?Sized> {
    slot: OnceLock<Arc<T>>,
}

impl<T: ?Sized> Inject<T> {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Returns the injected value, if any.
    #[must_use]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.slot.get()
    }

    /// Returns `true` once the slot has been populated.
    #[must_use]
    pub fn is_injected(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Populates the slot; returns `false` if it already held a value.
    pub(crate) fn fill(&self, value: Arc<T>) -> bool {
        self.slot.set(value).is_ok()
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Injected graphs may be cyclic; never recurse into the value.
impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_injected() { "injected" } else { "empty" };
        write!(f, "Inject<{}>({state})", std::any::type_name::<T>())
    }
}
