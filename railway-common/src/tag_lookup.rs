//! Tag lookup over dictionary-encoded arrays
//!
//! Hosts that intern tag strings keep each record as parallel key/value id
//! arrays plus shared dictionaries. `TagLookup` reads those without
//! materialising a map per record.

use std::collections::HashMap;

use crate::tags::Tags;

/// Helper for looking up tags in dictionary-encoded format
pub struct TagLookup<'a> {
    keys: &'a [u32],
    vals: &'a [u32],
    val_dict: &'a HashMap<u32, String>,
    /// Reverse map: key string → key ID for O(1) lookup
    rev_key: &'a HashMap<String, u32>,
}

impl<'a> TagLookup<'a> {
    /// Build a lookup over one record.
    ///
    /// `rev_key` is the reversed key dictionary; build it once per block with
    /// [`TagLookup::reverse_keys`] and share it across records.
    pub fn new(
        keys: &'a [u32],
        vals: &'a [u32],
        rev_key: &'a HashMap<String, u32>,
        val_dict: &'a HashMap<u32, String>,
    ) -> Self {
        Self {
            keys,
            vals,
            val_dict,
            rev_key,
        }
    }

    pub fn reverse_keys(key_dict: &HashMap<u32, String>) -> HashMap<String, u32> {
        key_dict.iter().map(|(id, s)| (s.clone(), *id)).collect()
    }

    /// Get a tag value by key ID (when working with IDs directly)
    pub fn get_by_id(&self, key_id: u32) -> Option<u32> {
        self.keys
            .iter()
            .position(|k| *k == key_id)
            .and_then(|i| self.vals.get(i).copied())
    }
}

impl Tags for TagLookup<'_> {
    fn get_str(&self, key: &str) -> Option<&str> {
        let key_id = *self.rev_key.get(key)?;
        let val_id = self.get_by_id(key_id)?;
        self.val_dict.get(&val_id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dicts() -> (HashMap<String, u32>, HashMap<u32, String>) {
        let mut key_dict = HashMap::new();
        key_dict.insert(1, "railway".to_string());
        key_dict.insert(2, "name".to_string());
        key_dict.insert(3, "usage".to_string());

        let mut val_dict = HashMap::new();
        val_dict.insert(10, "rail".to_string());
        val_dict.insert(20, "Ligne 1".to_string());
        val_dict.insert(30, "branch".to_string());

        (TagLookup::reverse_keys(&key_dict), val_dict)
    }

    #[test]
    fn test_tag_lookup_with_dicts() {
        let (rev_key, val_dict) = dicts();
        let keys = vec![1, 2];
        let vals = vec![10, 20];

        let tags = TagLookup::new(&keys, &vals, &rev_key, &val_dict);

        assert_eq!(tags.get_str("railway"), Some("rail"));
        assert_eq!(tags.get_str("name"), Some("Ligne 1"));
        assert_eq!(tags.get_str("usage"), None);
        assert_eq!(tags.get_str("surface"), None);
    }

    #[test]
    fn test_has_tag() {
        let (rev_key, val_dict) = dicts();
        let keys = vec![1, 3];
        let vals = vec![10, 30];

        let tags = TagLookup::new(&keys, &vals, &rev_key, &val_dict);

        assert!(tags.has_tag("usage", &["branch", "main"]));
        assert!(!tags.has_tag("railway", &["tram"]));
        assert!(!tags.has("name"));
    }

    #[test]
    fn test_mismatched_arrays() {
        let (rev_key, val_dict) = dicts();
        let keys = vec![1, 2];
        let vals = vec![10];

        let tags = TagLookup::new(&keys, &vals, &rev_key, &val_dict);

        assert_eq!(tags.get_str("railway"), Some("rail"));
        assert_eq!(tags.get_str("name"), None);
    }
}
