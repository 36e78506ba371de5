use core::any::Any;
use core::fmt;

use crate::{Field, Shape};

/// The semantic definition of a shape: which of the supported kinds it is.
///
/// This set is closed on purpose. The binder picks its setter with a single
/// `match` over these variants.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum Def {
    /// A leaf value parsed from a single string, e.g. `u32`, `String`, `bool`.
    Scalar(ScalarType),

    /// A record with named fields, usually from `#[derive(Bindable)]`.
    Struct(StructDef),

    /// An optional value that is allocated on demand, e.g. `Option<T>`.
    Option(OptionDef),

    /// A holder whose concrete type is only known at runtime, e.g.
    /// `Box<dyn DynBindable>`.
    Dynamic(DynamicDef),

    /// A type the binder knows about but cannot populate (lists, maps, sets).
    ///
    /// Binding to such a field is always an error. Types in this category may
    /// still bind if their shape carries a decode capability.
    Opaque,
}

/// All scalar types supported out of the box.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum ScalarType {
    /// `alloc::string::String`.
    String,
    /// Primitive type `bool`.
    Bool,
    /// Primitive type `i8`.
    I8,
    /// Primitive type `i16`.
    I16,
    /// Primitive type `i32`.
    I32,
    /// Primitive type `i64`.
    I64,
    /// Primitive type `i128`.
    I128,
    /// Primitive type `isize`.
    ISize,
    /// Primitive type `u8`.
    U8,
    /// Primitive type `u16`.
    U16,
    /// Primitive type `u32`.
    U32,
    /// Primitive type `u64`.
    U64,
    /// Primitive type `u128`.
    U128,
    /// Primitive type `usize`.
    USize,
    /// Primitive type `f32`.
    F32,
    /// Primitive type `f64`.
    F64,
}

impl ScalarType {
    /// Returns true for signed integer types.
    pub const fn is_signed_int(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::I128 | Self::ISize
        )
    }

    /// Returns true for unsigned integer types.
    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::U128 | Self::USize
        )
    }

    /// Returns true for floating point types.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// Describes a record: its fields, in declaration order.
#[derive(Clone, Copy, Debug)]
pub struct StructDef {
    /// One entry per declared field, bound or not.
    pub fields: &'static [Field],
}

/// Clears an option in place. Returns false if `option` is not of the expected type.
pub type OptionClearFn = fn(option: &mut dyn Any) -> bool;

/// Returns the value inside an option, allocating a default one first if the option is empty.
pub type OptionGetOrInsertFn = for<'a> fn(option: &'a mut dyn Any) -> Option<&'a mut dyn Any>;

/// Describes an `Option`-like pointer: the pointee shape and how to alter the option.
#[derive(Clone, Copy)]
pub struct OptionDef {
    /// Shape of the pointee.
    pub t: fn() -> &'static Shape,

    /// cf. [`OptionClearFn`]
    pub clear: OptionClearFn,

    /// cf. [`OptionGetOrInsertFn`]
    pub get_or_insert: OptionGetOrInsertFn,
}

impl OptionDef {
    /// Returns the shape of the pointee.
    pub fn t(&self) -> &'static Shape {
        (self.t)()
    }
}

impl fmt::Debug for OptionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionDef")
            .field("t", &self.t().type_name())
            .finish_non_exhaustive()
    }
}

/// Unwraps a dynamic holder into its concrete value and that value's shape.
pub type DynamicUnwrapFn =
    for<'a> fn(holder: &'a mut dyn Any) -> Option<(&'static Shape, &'a mut dyn Any)>;

/// Describes a dynamic holder.
#[derive(Clone, Copy)]
pub struct DynamicDef {
    /// cf. [`DynamicUnwrapFn`]
    pub unwrap: DynamicUnwrapFn,
}

impl fmt::Debug for DynamicDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicDef").finish_non_exhaustive()
    }
}
