use std::collections::{HashMap, HashSet};
use std::fmt;

/// Parameter values keyed by their absolute path, as fetched from a store.
///
/// Alongside the values, `Values` remembers which keys the store reported
/// invalid. An invalid key behaves exactly like an absent one for lookups;
/// the distinction only exists for diagnostics.
///
/// The `Debug` output lists keys but never values, since parameters are
/// frequently secrets.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Values {
    params: HashMap<String, String>,
    invalid: HashSet<String>,
}

impl Values {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping holding exactly one value.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = Self::new();
        values.insert(key, value);
        values
    }

    /// Builds a mapping from `(key, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Sets the value of `key`, clearing any invalid mark on it.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.invalid.remove(&key);
        self.params.insert(key, value.into());
    }

    /// Records that the store reported `key` as invalid.
    ///
    /// A key that already has a value keeps it.
    pub fn mark_invalid(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.params.contains_key(&key) {
            self.invalid.insert(key);
        }
    }

    /// Returns the value of `key`, or `None` if it is absent or invalid.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns true if `key` has a value, even an empty one.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Returns true if the store reported `key` as invalid.
    pub fn is_invalid(&self, key: &str) -> bool {
        self.invalid.contains(key)
    }

    /// Number of keys with a value.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no key has a value.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over the keys that have a value, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Iterates over the keys reported invalid, in no particular order.
    pub fn invalid_keys(&self) -> impl Iterator<Item = &str> {
        self.invalid.iter().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        values.extend(iter);
        values
    }
}

impl<K, V> Extend<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        let mut invalid: Vec<&str> = self.invalid_keys().collect();
        invalid.sort_unstable();

        f.debug_struct("Values")
            .field("keys", &keys)
            .field("invalid", &invalid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[parambind_testhelpers::test]
    fn invalid_keys_read_as_absent() {
        let mut values = Values::from_pairs([("/svc/port", "8080"), ("/svc/debug", "")]);
        values.mark_invalid("/svc/secret");
        values.mark_invalid("/svc/port");

        assert_eq!(values.get("/svc/port"), Some("8080"));
        assert_eq!(values.get("/svc/debug"), Some(""));
        assert!(values.contains("/svc/debug"));
        assert_eq!(values.get("/svc/secret"), None);
        assert!(!values.contains("/svc/secret"));
        assert!(values.is_invalid("/svc/secret"));
        assert!(!values.is_invalid("/svc/port"));
        assert_eq!(values.len(), 2);
    }

    #[parambind_testhelpers::test]
    fn inserting_clears_the_invalid_mark() {
        let mut values = Values::new();
        values.mark_invalid("/a");
        values.insert("/a", "1");
        assert!(!values.is_invalid("/a"));
        assert_eq!(values, Values::single("/a", "1"));
    }

    #[parambind_testhelpers::test]
    fn debug_hides_values() {
        let mut values = Values::from_pairs([("/db/password", "hunter2"), ("/db/user", "admin")]);
        values.mark_invalid("/db/host");

        let debug = format!("{values:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("admin"));
        insta::assert_snapshot!(debug, @r#"Values { keys: ["/db/password", "/db/user"], invalid: ["/db/host"] }"#);
    }
}
