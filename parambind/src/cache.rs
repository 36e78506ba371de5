use std::any::TypeId;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use parambind_core::Shape;

use crate::{BindError, RecordSpec, derive_record_spec};

/// Memoizes [`RecordSpec`]s per record type.
///
/// Specs are derived on first use and kept for the lifetime of the cache.
/// Concurrent first uses of the same type may derive it more than once, but
/// only one result is ever stored and every caller sees a complete spec.
#[derive(Debug, Default)]
pub struct SpecCache {
    specs: DashMap<TypeId, Arc<RecordSpec>>,
}

static GLOBAL: LazyLock<SpecCache> = LazyLock::new(SpecCache::new);

impl SpecCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by [`bind`](crate::bind) and
    /// [`Provider::new`](crate::Provider::new).
    pub fn global() -> &'static SpecCache {
        &GLOBAL
    }

    /// Returns the spec of the record described by `shape`, deriving it if needed.
    pub fn get(&self, shape: &'static Shape) -> Result<Arc<RecordSpec>, BindError> {
        let id = shape.type_id();
        if let Some(spec) = self.specs.get(&id) {
            return Ok(Arc::clone(&spec));
        }

        // derive outside of the map's shard lock
        let spec = Arc::new(derive_record_spec(shape)?);
        let spec = self.specs.entry(id).or_insert(spec);
        Ok(Arc::clone(&spec))
    }

    /// Number of record types cached so far.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindErrorKind, Bindable};

    #[derive(Bindable)]
    #[allow(dead_code)]
    struct Settings {
        #[param(key = "name")]
        name: String,
    }

    #[parambind_testhelpers::test]
    fn specs_are_derived_once() {
        let cache = SpecCache::new();
        assert!(cache.is_empty());

        let first = cache.get(Settings::SHAPE).unwrap();
        let second = cache.get(Settings::SHAPE).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[parambind_testhelpers::test]
    fn failures_are_not_cached() {
        let cache = SpecCache::new();
        let err = cache.get(u8::SHAPE).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::NotARecord { .. }));
        assert!(cache.is_empty());
    }

    #[parambind_testhelpers::test]
    fn concurrent_first_use_keeps_one_entry() {
        let cache = SpecCache::new();
        let specs: Vec<Arc<RecordSpec>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get(Settings::SHAPE).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        let stored = cache.get(Settings::SHAPE).unwrap();
        for spec in &specs {
            assert!(Arc::ptr_eq(spec, &stored));
        }
    }
}
