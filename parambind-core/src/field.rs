use core::any::Any;
use core::fmt;

use crate::Shape;

/// Describes a field in a record.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    /// Name of the field in the Rust source.
    pub name: &'static str,

    /// Binding metadata, present only when the field carries a `#[param]` attribute.
    ///
    /// Fields without it are invisible to the binder, and so are their descendants.
    pub binding: Option<FieldBinding>,
}

impl Field {
    /// A field the binder ignores.
    pub const fn unbound(name: &'static str) -> Self {
        Self {
            name,
            binding: None,
        }
    }

    /// A field the binder populates.
    pub const fn bound(name: &'static str, binding: FieldBinding) -> Self {
        Self {
            name,
            binding: Some(binding),
        }
    }
}

/// Projects a record onto one of its fields.
///
/// Returns `None` if `record` is not of the type the field belongs to.
pub type FieldAccessFn = for<'a> fn(record: &'a mut dyn Any) -> Option<&'a mut dyn Any>;

/// Everything the binder needs to know about a bound field.
#[derive(Clone, Copy)]
pub struct FieldBinding {
    /// Shape of the field's declared type.
    ///
    /// The layer of indirection allows records to refer to each other.
    pub shape: fn() -> &'static Shape,

    /// Raw attributes from `#[param(...)]`, uninterpreted.
    pub attributes: &'static [FieldAttribute],

    /// cf. [`FieldAccessFn`]
    pub access: FieldAccessFn,
}

impl FieldBinding {
    /// Returns the shape of the field's declared type.
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    /// Returns the value of the first attribute named `key`.
    #[inline]
    pub fn attr(&self, key: &str) -> Option<&'static str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value)
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("shape", &self.shape().type_name())
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

/// A single `name = "value"` pair from a `#[param(...)]` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldAttribute {
    /// The attribute name, e.g. `key`, `default`, `required`.
    pub key: &'static str,
    /// The attribute value, verbatim.
    pub value: &'static str,
}
