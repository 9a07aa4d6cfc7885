//! A dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] backs query strings and form bodies, where a single key
//! may appear several times. Keys keep the order of their first appearance.

/// An insertion-ordered dictionary that maps keys to lists of values.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key, while
/// [`get_list`](MultiValueDict::get_list) returns all values in arrival order.
///
/// # Examples
///
/// ```
/// use bobo_rs_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color", "red");
/// d.append("color", "blue");
///
/// assert_eq!(d.get(&"color"), Some(&"blue"));
/// assert_eq!(d.get_list(&"color"), Some(&["red", "blue"][..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiValueDict<K, V> {
    entries: Vec<(K, Vec<V>)>,
}

impl<K: PartialEq, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Returns the **last** value associated with the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_list(key).and_then(<[V]>::last)
    }

    /// Returns all values associated with the key.
    pub fn get_list(&self, key: &K) -> Option<&[V]> {
        self.position(key).map(|i| self.entries[i].1.as_slice())
    }

    /// Sets the value for a key, replacing any existing values.
    pub fn set(&mut self, key: K, value: V) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        match self.position(&key) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over `(key, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.position(key).is_some()
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for MultiValueDict<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.append(k, v);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_default_is_empty() {
        let mut d = MultiValueDict::<String, String>::default();
        assert!(d.is_empty());
        d.append("k".to_string(), "v".to_string());
        assert_eq!(d.get(&"k".to_string()).map(String::as_str), Some("v"));
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get(&"color"), Some(&"green"));
        assert_eq!(d.get_list(&"color"), Some(&["red", "blue", "green"][..]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("k", "b");
        d.set("k", "c");
        assert_eq!(d.get_list(&"k"), Some(&["c"][..]));
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let d: MultiValueDict<_, _> = [("z", 1), ("a", 2), ("z", 3), ("m", 4)]
            .into_iter()
            .collect();
        let keys: Vec<_> = d.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(d.get_list(&"z"), Some(&[1, 3][..]));
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::new();
        assert_eq!(d.get(&"missing"), None);
        assert!(!d.contains_key(&"missing"));
    }
}
