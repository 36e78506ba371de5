#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

// The derive emits `::parambind::...` paths; this makes them resolve inside
// this crate's own tests too.
extern crate self as parambind;

#[macro_use]
mod tracing_macros;

pub use parambind_core::*;
pub use parambind_macros::Bindable;

mod error;
pub use error::{BindError, BindErrorKind, StoreError};

mod values;
pub use values::Values;

pub mod path;

mod spec;
pub use spec::{BoundField, FieldSpec, RecordSpec, derive_record_spec};

mod cache;
pub use cache::SpecCache;

mod setter;
pub use setter::{InvalidBool, OutOfRange, Setter};

mod bind;
pub use bind::{Binder, bind};

pub mod keys;

mod store;
pub use store::{MemoryStore, Parameter, ParameterBatch, ParameterRequest, ParameterStore};

mod provider;
pub use provider::{Provider, ProviderConfig};
