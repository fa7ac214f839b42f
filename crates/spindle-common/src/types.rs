//! Domain primitive types used across the Spindle workspace.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Nominal identity of a Rust type, usable as a map key.
///
/// Works for unsized contract types such as `dyn Trait`. Equality and
/// hashing only consider the [`TypeId`]; the name is kept for messages.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path.
    ///
    /// Generic arguments and `dyn` prefixes are kept, only the leading
    /// path of the outermost segment is dropped.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        head.rfind("::")
            .map_or(self.name, |idx| &self.name[idx + 2..])
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Marker kind behind [`Qualifier::named`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Named;

/// Tag distinguishing several bindings of the same contract type.
///
/// Two qualifiers are equal only when both their marker kind and their
/// value match: `Qualifier::named("a")` never equals a custom kind
/// carrying the value `"a"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qualifier {
    kind: TypeKey,
    value: String,
}

impl Qualifier {
    /// Creates a qualifier of marker kind `K`.
    #[must_use]
    pub fn of<K: ?Sized + 'static>(value: impl Into<String>) -> Self {
        Self {
            kind: TypeKey::of::<K>(),
            value: value.into(),
        }
    }

    /// Creates a [`Named`] qualifier.
    #[must_use]
    pub fn named(value: impl Into<String>) -> Self {
        Self::of::<Named>(value)
    }

    /// Returns the marker kind.
    #[must_use]
    pub const fn kind(&self) -> TypeKey {
        self.kind
    }

    /// Returns the marker value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({:?})", self.kind.short_name(), self.value)
    }
}

/// Unique identifier for an injector instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InjectorId(String);

impl InjectorId {
    /// Creates an injector ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random injector ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InjectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Contract {}
    struct Custom;

    #[test]
    fn type_keys_compare_by_identity() {
        assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
        assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<u64>());
        assert_ne!(TypeKey::of::<dyn Contract>(), TypeKey::of::<Custom>());
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(TypeKey::of::<Custom>().short_name(), "Custom");
        assert_eq!(TypeKey::of::<u8>().short_name(), "u8");
    }

    #[test]
    fn qualifiers_require_matching_kind_and_value() {
        assert_eq!(Qualifier::named("a"), Qualifier::named("a"));
        assert_ne!(Qualifier::named("a"), Qualifier::named("b"));
        assert_ne!(Qualifier::named("a"), Qualifier::of::<Custom>("a"));
    }

    #[test]
    fn qualifier_display_shows_kind_and_value() {
        assert_eq!(Qualifier::named("a").to_string(), "@Named(\"a\")");
        assert_eq!(Qualifier::of::<Custom>("x").to_string(), "@Custom(\"x\")");
    }

    #[test]
    fn generated_injector_ids_are_unique() {
        let a = InjectorId::generate();
        let b = InjectorId::generate();
        assert_ne!(a, b);
        assert_eq!(InjectorId::new("fixed").as_str(), "fixed");
    }
}
