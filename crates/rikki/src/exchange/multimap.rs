//! Ordered multi-valued map for HTTP headers and query parameters.
//!
//! Keys keep their first-seen spelling and insertion order. Each key owns an
//! ordered list of values. Header maps compare keys ASCII case-insensitively,
//! query maps compare them exactly.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Insertion-ordered map from a key to an ordered list of values.
///
/// Build one with [`MultiMap::headers`] or [`MultiMap::query`]; key case
/// handling is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiMap {
    entries: Vec<(String, Vec<String>)>,
    case_insensitive: bool,
}

impl MultiMap {
    /// Empty map with case-sensitive keys (query parameters).
    pub fn query() -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive: false,
        }
    }

    /// Empty map with ASCII case-insensitive keys (HTTP headers).
    pub fn headers() -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive: true,
        }
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    #[inline]
    fn key_eq(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| self.key_eq(k, key))
    }

    /// All values stored under `key`, in insertion order. Empty if absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        match self.position(key) {
            Some(idx) => &self.entries[idx].1,
            None => &[],
        }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Whether `value` appears in the value list of `key`.
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get_all(key).iter().any(|v| v == value)
    }

    /// Replace the value list of `key`.
    ///
    /// An existing key keeps its position and spelling. An empty list removes the key.
    pub fn set_all(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        if values.is_empty() {
            self.remove(&key);
            return;
        }
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Replace the value list of `key` with a single value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_all(key, vec![value.into()]);
    }

    /// Add a value to the end of the value list of `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Remove `key`, returning its values.
    pub fn remove(&mut self, key: &str) -> Vec<String> {
        match self.position(key) {
            Some(idx) => self.entries.remove(idx).1,
            None => Vec::new(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over `(key, values)` entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate over flattened `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-key this map with case-insensitive keys, merging keys that differ only in case.
    pub fn into_case_insensitive(self) -> Self {
        let mut merged = MultiMap::headers();
        merged.extend(
            self.entries
                .into_iter()
                .flat_map(|(k, vs)| vs.into_iter().map(move |v| (k.clone(), v))),
        );
        merged
    }
}

impl<K, V> Extend<(K, V)> for MultiMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.append(k, v);
        }
    }
}

impl Serialize for MultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, vs) in &self.entries {
            map.serialize_entry(k, vs)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

struct MultiMapVisitor;

impl<'de> Visitor<'de> for MultiMapVisitor {
    type Value = MultiMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of strings to a string or a list of strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = MultiMap::query();
        while let Some((key, values)) = access.next_entry::<String, OneOrMany>()? {
            match values {
                OneOrMany::One(v) => map.append(key, v),
                OneOrMany::Many(vs) => {
                    for v in vs {
                        map.append(key.clone(), v);
                    }
                }
            }
        }
        Ok(map)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MultiMap::query())
    }
}

/// Deserializes with case-sensitive keys; use [`deserialize_headers`] for header maps.
impl<'de> Deserialize<'de> for MultiMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MultiMapVisitor)
    }
}

/// Deserialize a header map (case-insensitive keys).
pub fn deserialize_headers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MultiMap, D::Error> {
    MultiMap::deserialize(deserializer).map(MultiMap::into_case_insensitive)
}
