use std::sync::Arc;

use parambind_core::Bindable;

use crate::{
    BindError, Binder, ParameterRequest, ParameterStore, SpecCache, Values, keys::collect_keys,
};

/// How a [`Provider`] talks to its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct ProviderConfig {
    /// Maximum number of names per store request. Zero is treated as one.
    pub batch_size: usize,

    /// Whether to ask the store to decrypt encrypted parameters.
    pub with_decryption: bool,
}

impl ProviderConfig {
    /// The batch size used unless configured otherwise. Parameter stores
    /// commonly cap a single lookup at this many names.
    pub const DEFAULT_BATCH_SIZE: usize = 10;

    /// The default configuration: batches of 10, decryption enabled.
    pub fn new() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            with_decryption: true,
        }
    }

    /// Sets the maximum number of names per request. Zero is treated as one.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Enables or disables decryption of encrypted parameters.
    pub fn with_decryption(mut self, with_decryption: bool) -> Self {
        self.with_decryption = with_decryption;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads records from a [`ParameterStore`].
///
/// ```
/// use parambind::{Bindable, MemoryStore, Provider};
///
/// #[derive(Bindable, Default)]
/// struct Config {
///     #[param(key = "/db/url", required)]
///     db_url: String,
///     #[param(key = "/workers", default = "4")]
///     workers: usize,
/// }
///
/// let store = MemoryStore::from_iter([("/prod/db/url", "postgres://db")]);
/// let mut config = Config::default();
/// Provider::new(&store).process("/prod", &mut config).unwrap();
///
/// assert_eq!(config.db_url, "postgres://db");
/// assert_eq!(config.workers, 4);
/// assert_eq!(store.requested_names(), ["/prod/db/url", "/prod/workers"]);
/// ```
#[derive(Debug)]
pub struct Provider<S> {
    store: S,
    config: ProviderConfig,
    cache: Option<Arc<SpecCache>>,
}

impl<S: ParameterStore> Provider<S> {
    /// Creates a provider with the default configuration, using the
    /// process-wide [`SpecCache`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: ProviderConfig::default(),
            cache: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `cache` instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<SpecCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The store this provider reads from.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration in use.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn cache(&self) -> &SpecCache {
        self.cache.as_deref().unwrap_or_else(|| SpecCache::global())
    }

    /// Fetches every key `target` needs from the store, then binds them.
    ///
    /// Keys are requested in field declaration order, split into batches of
    /// [`ProviderConfig::batch_size`]. If the store fails, nothing is bound.
    pub fn process<T: Bindable>(&self, prefix: &str, target: &mut T) -> Result<(), BindError> {
        let keys: Vec<String> = collect_keys(self.cache(), prefix, target)?
            .into_iter()
            .collect();
        let values = self.fetch(&keys)?;
        Binder::new(self.cache()).bind(prefix, target, &values)
    }

    /// Requests `names` from the store in batches and merges the answers.
    pub fn fetch(&self, names: &[String]) -> Result<Values, BindError> {
        let mut values = Values::new();

        for chunk in names.chunks(self.config.batch_size.max(1)) {
            debug!(names = chunk.len(), "requesting parameters");
            let batch = self.store.get_parameters(&ParameterRequest {
                names: chunk,
                with_decryption: self.config.with_decryption,
            })?;
            trace!(
                found = batch.parameters.len(),
                invalid = batch.invalid.len(),
                "received parameters"
            );

            values.extend(
                batch
                    .parameters
                    .into_iter()
                    .map(|parameter| (parameter.name, parameter.value)),
            );
            for name in batch.invalid {
                values.mark_invalid(name);
            }
        }

        Ok(values)
    }
}
