//! Content-Type derivation for substituted response bodies.

pub const JSON: &str = "application/json; charset=UTF-8";
pub const HTML: &str = "text/html; charset=utf-8";
pub const PLAIN: &str = "text/plain";

const HTML_DOCTYPE: &str = "<!DOCTYPE html>";

/// Pick a Content-Type for `body`: JSON if it parses, HTML if it opens with a
/// doctype (any case), plain text otherwise.
pub fn derive(body: &str) -> &'static str {
    if serde_json::from_str::<serde_json::Value>(body).is_ok() {
        JSON
    } else if body
        .get(..HTML_DOCTYPE.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(HTML_DOCTYPE))
    {
        HTML
    } else {
        PLAIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_bodies() {
        assert_eq!(derive(r#"{"ok":true}"#), JSON);
        assert_eq!(derive("[1, 2]"), JSON);
        assert_eq!(derive(" 42 "), JSON);
        assert_eq!(derive("null"), JSON);
    }

    #[test]
    fn test_html_doctype_any_case() {
        assert_eq!(derive("<!DOCTYPE html><html></html>"), HTML);
        assert_eq!(derive("<!doctype HTML>\n<p>hi</p>"), HTML);
    }

    #[test]
    fn test_html_without_doctype_is_plain() {
        assert_eq!(derive("<html></html>"), PLAIN);
        assert_eq!(derive(" <!DOCTYPE html>"), PLAIN);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(derive("hello"), PLAIN);
        assert_eq!(derive(""), PLAIN);
        // Multi-byte text shorter than the doctype must not panic
        assert_eq!(derive("ü"), PLAIN);
        assert_eq!(derive("ééééééééééééééé"), PLAIN);
    }
}
