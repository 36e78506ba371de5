#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod derive;

/// Derives `parambind::Bindable` for a struct with named fields.
///
/// See the crate documentation for the `#[param(...)]` attribute.
#[proc_macro_derive(Bindable, attributes(param))]
pub fn bindable(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    derive::derive_bindable(input.into()).into()
}
