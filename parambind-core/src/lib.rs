#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod shape;
pub use shape::*;

mod def;
pub use def::*;

mod field;
pub use field::*;

mod decode;
pub use decode::*;

mod impls;
pub use impls::DynBindable;

/// A type that can be the target of a binding.
///
/// The binder never inspects values directly: everything it knows about a type
/// comes from [`Bindable::SHAPE`]. Records implement this trait through
/// `#[derive(Bindable)]`; scalars, `Option<T>`, `Box<dyn DynBindable>` and the
/// common std containers are covered by this crate.
pub trait Bindable: core::any::Any {
    /// The static description of this type.
    const SHAPE: &'static Shape;
}

/// Returns the shape of `T`.
///
/// Field descriptors store this as a function pointer so that record shapes can
/// refer to each other without evaluating eagerly.
pub fn shape_of<T: Bindable>() -> &'static Shape {
    T::SHAPE
}
