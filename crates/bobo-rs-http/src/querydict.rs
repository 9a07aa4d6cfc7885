//! Multi-valued parameter dictionary for query strings and form bodies.
//!
//! [`QueryDict`] wraps [`MultiValueDict`](bobo_rs_core::utils::MultiValueDict)
//! and keeps the values of a repeated key in the order they were sent, so the
//! binder can hand a handler every value of `?tag=a&tag=b`.

use bobo_rs_core::utils::MultiValueDict;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped by [`QueryDict::urlencode`].
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A dictionary of decoded `application/x-www-form-urlencoded` parameters.
///
/// # Examples
///
/// ```
/// use bobo_rs_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color"), Some(&["red".to_string(), "blue".to_string()][..]));
/// assert_eq!(qd.get("size"), Some("large"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDict {
    data: MultiValueDict<String, String>,
}

impl QueryDict {
    /// Creates an empty `QueryDict`.
    pub const fn new() -> Self {
        Self {
            data: MultiValueDict::new(),
        }
    }

    /// Parses a URL query string or form body (e.g. `"key1=val1&key2=val2"`).
    ///
    /// Keys and values are percent-decoded and `+` is read as a space. Empty
    /// pairs are skipped; a key without `=` gets an empty value.
    pub fn parse(query_string: &str) -> Self {
        let mut data = MultiValueDict::new();

        for pair in query_string.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.append(percent_decode(key), percent_decode(value));
        }

        Self { data }
    }

    /// Returns the last value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(&key.to_string()).map(String::as_str)
    }

    /// Returns every value for the given key, in the order they were sent.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get_list(&key.to_string())
    }

    /// Appends a value for the given key.
    pub fn append(&mut self, key: &str, value: &str) {
        self.data.append(key.to_string(), value.to_string());
    }

    /// Replaces all values for the given key with a single value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.data.set(key.to_string(), value.to_string());
    }

    /// Encodes this `QueryDict` as a query string, preserving key order.
    pub fn urlencode(&self) -> String {
        self.data
            .iter()
            .flat_map(|(key, values)| {
                values.iter().map(move |value| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(key, QUERY_ENCODE_SET),
                        utf8_percent_encode(value, QUERY_ENCODE_SET)
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Returns an iterator over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Returns an iterator over each key and all of its values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &[String])> {
        self.data.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let qd = QueryDict::new();
        assert!(qd.is_empty());
        assert_eq!(qd.len(), 0);
    }

    #[test]
    fn test_parse_multiple_keys() {
        let qd = QueryDict::parse("a=1&b=2&c=3");
        assert_eq!(qd.get("a"), Some("1"));
        assert_eq!(qd.get("c"), Some("3"));
        assert_eq!(qd.len(), 3);
        let keys: Vec<&String> = qd.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_parse_repeated_key_keeps_order() {
        let qd = QueryDict::parse("tag=red&other=1&tag=blue");
        assert_eq!(qd.get("tag"), Some("blue"));
        assert_eq!(
            qd.get_list("tag"),
            Some(&["red".to_string(), "blue".to_string()][..])
        );
    }

    #[test]
    fn test_parse_decoding() {
        let qd = QueryDict::parse("name=John+Doe&city=S%C3%A3o%20Paulo&empty=&flag");
        assert_eq!(qd.get("name"), Some("John Doe"));
        assert_eq!(qd.get("city"), Some("São Paulo"));
        assert_eq!(qd.get("empty"), Some(""));
        assert_eq!(qd.get("flag"), Some(""));
    }

    #[test]
    fn test_parse_skips_empty_pairs() {
        let qd = QueryDict::parse("&&a=1&");
        assert_eq!(qd.len(), 1);
        assert!(QueryDict::parse("").is_empty());
    }

    #[test]
    fn test_set_and_append() {
        let mut qd = QueryDict::new();
        qd.append("x", "1");
        qd.append("x", "2");
        assert_eq!(qd.get_list("x").map(<[String]>::len), Some(2));
        qd.set("x", "3");
        assert_eq!(qd.get_list("x"), Some(&["3".to_string()][..]));
        assert!(qd.contains_key("x"));
        assert!(!qd.contains_key("y"));
    }

    #[test]
    fn test_urlencode() {
        let qd: QueryDict = [("q", "a b&c"), ("q", "d"), ("page", "2")]
            .into_iter()
            .collect();
        assert_eq!(qd.urlencode(), "q=a%20b%26c&q=d&page=2");
    }
}
