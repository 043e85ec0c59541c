//! Containment matching for headers and query parameters.
//!
//! A required map is contained in an actual multi-map when every required
//! key is present and its required value appears somewhere in that key's
//! value list. Key comparison follows the multi-map (case-insensitive for
//! headers, exact for query parameters); values compare exactly.

use crate::exchange::MultiMap;
use std::collections::BTreeMap;

/// Required field values, keyed by field name.
pub type FieldMap = BTreeMap<String, String>;

/// Return the first required key whose value is missing from `actual`.
pub fn first_unmet<'a>(actual: &MultiMap, required: &'a FieldMap) -> Option<&'a str> {
    required
        .iter()
        .find(|(key, value)| !actual.contains(key, value))
        .map(|(key, _)| key.as_str())
}

/// Check that every `(key, value)` of `required` is contained in `actual`.
pub fn contains(actual: &MultiMap, required: &FieldMap) -> bool {
    first_unmet(actual, required).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_requirement_always_matches() {
        assert!(contains(&MultiMap::headers(), &FieldMap::new()));
    }

    #[test]
    fn test_value_anywhere_in_list() {
        let mut headers = MultiMap::headers();
        headers.append("Set-Cookie", "a=1");
        headers.append("Set-Cookie", "b=2");

        assert!(contains(&headers, &required(&[("Set-Cookie", "b=2")])));
        assert!(contains(&headers, &required(&[("set-cookie", "a=1")])));
        assert!(!contains(&headers, &required(&[("Set-Cookie", "c=3")])));
    }

    #[test]
    fn test_missing_key_fails() {
        let mut query = MultiMap::query();
        query.append("page", "1");

        let req = required(&[("page", "1"), ("sort", "desc")]);
        assert!(!contains(&query, &req));
        assert_eq!(first_unmet(&query, &req), Some("sort"));
    }

    #[test]
    fn test_query_keys_are_case_sensitive() {
        let mut query = MultiMap::query();
        query.append("Page", "1");
        assert!(!contains(&query, &required(&[("page", "1")])));
    }

    #[test]
    fn test_values_are_exact() {
        let mut headers = MultiMap::headers();
        headers.append("Accept", "application/json");
        assert!(!contains(&headers, &required(&[("Accept", "Application/JSON")])));
    }
}
