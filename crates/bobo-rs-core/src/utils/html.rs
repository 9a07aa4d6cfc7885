//! HTML escaping.

/// Escapes `&`, `<`, `>`, `"` and `'` so `text` can be embedded in HTML
/// element content or a quoted attribute.
///
/// # Examples
///
/// ```
/// use bobo_rs_core::utils::html::escape;
///
/// assert_eq!(escape("<b>\"hi\"</b>"), "&lt;b&gt;&quot;hi&quot;&lt;/b&gt;");
/// ```
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escape_ampersand_first() {
        assert_eq!(escape("a&lt;b"), "a&amp;lt;b");
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape("plain text / 123"), "plain text / 123");
    }
}
