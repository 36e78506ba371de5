use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;

use crate::StoreError;

/// A request for a batch of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterRequest<'a> {
    /// Absolute keys to fetch.
    pub names: &'a [String],

    /// Whether encrypted parameters should be returned decrypted.
    pub with_decryption: bool,
}

/// A single parameter returned by a store.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameter {
    /// The absolute key.
    pub name: String,
    /// The value, verbatim.
    pub value: String,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl core::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The answer to a [`ParameterRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBatch {
    /// Parameters that were found.
    pub parameters: Vec<Parameter>,

    /// Requested keys the store could not resolve.
    pub invalid: Vec<String>,
}

/// A source of parameters, such as a remote parameter store.
///
/// Implementations do all of the I/O; the binder never talks to the
/// network itself. Requests never contain more names than the
/// [`ProviderConfig::batch_size`](crate::ProviderConfig::batch_size) in use.
pub trait ParameterStore {
    /// Fetches the requested parameters.
    ///
    /// Keys that cannot be resolved belong in [`ParameterBatch::invalid`].
    /// Errors are reserved for failures of the store itself.
    fn get_parameters(&self, request: &ParameterRequest<'_>) -> Result<ParameterBatch, StoreError>;
}

impl<S: ParameterStore + ?Sized> ParameterStore for &S {
    fn get_parameters(&self, request: &ParameterRequest<'_>) -> Result<ParameterBatch, StoreError> {
        (**self).get_parameters(request)
    }
}

impl<S: ParameterStore + ?Sized> ParameterStore for Arc<S> {
    fn get_parameters(&self, request: &ParameterRequest<'_>) -> Result<ParameterBatch, StoreError> {
        (**self).get_parameters(request)
    }
}

/// An in-memory [`ParameterStore`].
///
/// Unknown keys are reported invalid. Every request is recorded, which makes
/// this store handy in tests.
///
/// ```
/// use parambind::{MemoryStore, ParameterRequest, ParameterStore};
///
/// let store = MemoryStore::from_iter([("/svc/port", "8080")]);
/// let names = ["/svc/port".to_owned(), "/svc/host".to_owned()];
/// let batch = store
///     .get_parameters(&ParameterRequest { names: &names, with_decryption: true })
///     .unwrap();
///
/// assert_eq!(batch.parameters.len(), 1);
/// assert_eq!(batch.invalid, ["/svc/host"]);
/// assert_eq!(store.requests().len(), 1);
/// ```
#[derive(Default)]
pub struct MemoryStore {
    parameters: IndexMap<String, String>,
    failure: Option<String>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Makes every request fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// The names of every request received so far, in order.
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All names requested so far, flattened.
    pub fn requested_names(&self) -> Vec<String> {
        self.requests().into_iter().flatten().collect()
    }
}

impl core::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("names", &self.parameters.keys().collect::<Vec<_>>())
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (name, value) in iter {
            store.insert(name, value);
        }
        store
    }
}

impl ParameterStore for MemoryStore {
    fn get_parameters(&self, request: &ParameterRequest<'_>) -> Result<ParameterBatch, StoreError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.names.to_vec());

        if let Some(message) = &self.failure {
            return Err(StoreError::new(message.clone()));
        }

        let mut batch = ParameterBatch::default();
        for name in request.names {
            match self.parameters.get(name) {
                Some(value) => {
                    let parameter = Parameter::new(name.clone(), value.clone());
                    batch.parameters.push(parameter);
                }
                None => batch.invalid.push(name.clone()),
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[parambind_testhelpers::test]
    fn unknown_names_are_invalid() {
        let store = MemoryStore::from_iter([("/a", "1"), ("/b", "")]);
        let names = names(&["/a", "/b", "/c"]);
        let batch = store
            .get_parameters(&ParameterRequest {
                names: &names,
                with_decryption: false,
            })
            .unwrap();

        assert_eq!(
            batch.parameters,
            [Parameter::new("/a", "1"), Parameter::new("/b", "")]
        );
        assert_eq!(batch.invalid, ["/c"]);
    }

    #[parambind_testhelpers::test]
    fn requests_are_recorded_even_when_failing() {
        let store = Arc::new(MemoryStore::failing("throttled"));
        let names = names(&["/a"]);
        let request = ParameterRequest {
            names: &names,
            with_decryption: true,
        };

        let err = store.get_parameters(&request).unwrap_err();
        assert_eq!(err.message(), "throttled");
        let err = (&*store).get_parameters(&request).unwrap_err();
        assert_eq!(err.to_string(), "throttled");
        assert_eq!(store.requests(), [names.clone(), names]);
    }

    #[parambind_testhelpers::test]
    fn parameter_debug_hides_the_value() {
        let debug = format!("{:?}", Parameter::new("/db/password", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
