use core::any::TypeId;
use core::fmt;

use crate::{DecodeTextFn, Def, DynamicDef, Field, OptionDef, ScalarType, StructDef};

/// Static description of a bindable type.
///
/// Shapes are built in const context (usually by `#[derive(Bindable)]`) and
/// live for the whole program. Two shapes describe the same type exactly when
/// their [`Shape::type_id`] agree; the address of a shape carries no meaning.
#[derive(Clone, Copy)]
pub struct Shape {
    /// Returns the [`TypeId`] of the described type.
    pub id: fn() -> TypeId,

    /// Returns the fully qualified name of the described type.
    pub type_name: fn() -> &'static str,

    /// What kind of type this is, and how to reach its insides.
    pub def: Def,

    /// Text decoding capability, if the type implements [`crate::DecodeText`].
    ///
    /// When present it takes priority over [`Shape::def`].
    pub decode: Option<DecodeTextFn>,
}

impl Shape {
    /// Shape of a scalar type.
    pub const fn scalar<T: 'static>(scalar: ScalarType) -> Self {
        Self::new::<T>(Def::Scalar(scalar))
    }

    /// Shape of a record with the given fields, in declaration order.
    pub const fn record<T: 'static>(fields: &'static [Field]) -> Self {
        Self::new::<T>(Def::Struct(StructDef { fields }))
    }

    /// Shape of an `Option`-like pointer.
    pub const fn option<T: 'static>(def: OptionDef) -> Self {
        Self::new::<T>(Def::Option(def))
    }

    /// Shape of a holder for values whose concrete type is only known at runtime.
    pub const fn dynamic<T: 'static>(def: DynamicDef) -> Self {
        Self::new::<T>(Def::Dynamic(def))
    }

    /// Shape of a type the binder knows of but cannot populate.
    pub const fn opaque<T: 'static>() -> Self {
        Self::new::<T>(Def::Opaque)
    }

    /// Attaches a text decoding capability.
    pub const fn with_decode(mut self, decode: DecodeTextFn) -> Self {
        self.decode = Some(decode);
        self
    }

    const fn new<T: 'static>(def: Def) -> Self {
        Self {
            id: TypeId::of::<T>,
            type_name: core::any::type_name::<T>,
            def,
            decode: None,
        }
    }

    /// The [`TypeId`] of the described type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.id)()
    }

    /// The fully qualified name of the described type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns true if this shape describes a record (a struct with fields).
    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self.def, Def::Struct(_))
    }

    /// Returns the fields of a record shape.
    #[inline]
    pub fn fields(&self) -> Option<&'static [Field]> {
        match self.def {
            Def::Struct(StructDef { fields }) => Some(fields),
            _ => None,
        }
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for Shape {}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type_name", &self.type_name())
            .field("def", &self.def)
            .field("decode", &self.decode.is_some())
            .finish()
    }
}
