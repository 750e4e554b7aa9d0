//! Case-insensitive keys and ordered maps for headers and query parameters.
//!
//! HTTP field names compare ASCII-case-insensitively, but the spelling a
//! handler used should survive to the wire. [`CiString`] keeps the original
//! text and normalizes only for hashing and equality.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A string key that hashes and compares ignoring ASCII case.
#[derive(Debug, Clone, Default)]
pub struct CiString(String);

impl CiString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The original spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

}

impl PartialEq for CiString {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for CiString {}

impl PartialEq<str> for CiString {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for CiString {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Hash for CiString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for CiString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CiString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.0.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl fmt::Display for CiString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CiString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CiString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Insertion-ordered map with case-insensitive keys.
///
/// Inserting an existing key replaces its value in place (last write wins)
/// and keeps the first position, so serialization order is stable.
/// Lookups go through a hash index, so building a map is linear in the
/// number of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiMap<V> {
    entries: Vec<(CiString, V)>,
    index: HashMap<CiString, usize>,
}

/// Header map: case-insensitive names, case-sensitive values.
pub type HeaderMap = CiMap<String>;

impl<V> CiMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(&CiString::from(key)).copied()
    }

    /// Inserts or replaces; returns the previous value when one existed.
    pub fn insert(&mut self, key: impl Into<CiString>, value: V) -> Option<V> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.index.remove(&CiString::from(key))?;
        for position in self.index.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
        Some(self.entries.remove(removed).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V> Default for CiMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<CiString>, V> FromIterator<(K, V)> for CiMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn keys_compare_ignoring_case() {
        assert_eq!(CiString::from("Content-Length"), CiString::from("content-length"));
        assert_ne!(CiString::from("Host"), CiString::from("Hosts"));
    }

    #[test]
    fn hash_map_lookup_ignores_case() {
        let mut map = HashMap::new();
        map.insert(CiString::from("/Index.html"), 1);
        assert_eq!(map.get(&CiString::from("/index.HTML")), Some(&1));
    }

    #[test]
    fn insert_replaces_and_keeps_position() {
        let mut map = HeaderMap::new();
        map.insert("Host", "a".to_string());
        map.insert("Accept", "*/*".to_string());
        map.insert("HOST", "b".to_string());

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("Host", &"b".to_string()));
    }

    #[test]
    fn remove_keeps_later_entries_reachable() {
        let mut map = HeaderMap::new();
        map.insert("A", "1".to_string());
        map.insert("B", "2".to_string());
        map.insert("C", "3".to_string());

        assert_eq!(map.remove("b"), Some("2".to_string()));
        assert_eq!(map.get("c").map(String::as_str), Some("3"));
        assert_eq!(map.get("B"), None);

        map.insert("D", "4".to_string());
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "C", "D"]);
        assert_eq!(map.get("d").map(String::as_str), Some("4"));
    }
}
