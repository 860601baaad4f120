//! Read-only tag access
//!
//! Relations and elements arrive as whatever record type the host parses
//! them into. The profile only ever asks two questions of a record, "what is
//! the value of this key" and "is this key one of these values", so that is
//! the whole interface.

use std::collections::{BTreeMap, HashMap};

/// Narrow read-only view over an OSM tag set
pub trait Tags {
    /// Get a tag value by key name
    fn get_str(&self, key: &str) -> Option<&str>;

    /// Check if a key exists
    fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    /// Check if `key` is present with one of `values`
    fn has_tag(&self, key: &str, values: &[&str]) -> bool {
        self.get_str(key).is_some_and(|v| values.contains(&v))
    }

    /// Owned copy of a tag value, for attributes that outlive the record
    fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(str::to_string)
    }
}

/// Owned tag set for hosts that do not keep their own representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    tags: HashMap<String, String>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.tags.insert(key.into(), value.into())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for TagMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tags: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Tags for TagMap {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

impl Tags for HashMap<String, String> {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Tags for BTreeMap<String, String> {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Tag lists as decoded straight out of a PBF block, first match wins
impl Tags for [(String, String)] {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<T: Tags + ?Sized> Tags for &T {
    fn get_str(&self, key: &str) -> Option<&str> {
        (**self).get_str(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_map() {
        let tags = TagMap::new()
            .with("railway", "rail")
            .with("usage", "main");

        assert_eq!(tags.get_str("railway"), Some("rail"));
        assert_eq!(tags.get_str("name"), None);
        assert!(tags.has("usage"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_has_tag_value_set() {
        let tags: TagMap = [("route", "tram"), ("type", "route")].into_iter().collect();

        assert!(tags.has_tag("route", &["subway", "tram", "train"]));
        assert!(!tags.has_tag("route", &["subway", "train"]));
        assert!(!tags.has_tag("network", &["VBB"]));
    }

    #[test]
    fn test_pair_slice() {
        let tags = vec![
            ("railway".to_string(), "signal".to_string()),
            ("name".to_string(), "A1".to_string()),
        ];

        assert_eq!(tags.as_slice().get_str("name"), Some("A1"));
        assert_eq!(tags.as_slice().get_string("railway"), Some("signal".to_string()));
        assert!(!tags.as_slice().has("ref"));
    }
}
