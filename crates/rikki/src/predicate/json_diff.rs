//! Structural diff between two JSON documents.
//!
//! Objects are compared key by key. Arrays are compared as multisets: items
//! are paired by exact equality regardless of position, and whatever is left
//! over is reported as removed (left side) or added (right side). Scalars of
//! different value or type are reported as changed.
//!
//! Paths use a JSONPath-like notation rooted at `$`, e.g. `$.items[2].id`.

use serde_json::Value;

/// An item present on only one side of the diff.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffItem<'a> {
    pub path: String,
    pub value: &'a Value,
}

/// A value that differs between both sides at the same path.
#[derive(Debug, Clone, PartialEq)]
pub struct Change<'a> {
    pub path: String,
    pub left: &'a Value,
    pub right: &'a Value,
}

/// Result of diffing `left` against `right`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonDiff<'a> {
    /// Present in `right` only
    pub added: Vec<DiffItem<'a>>,
    /// Present in `left` only
    pub removed: Vec<DiffItem<'a>>,
    /// Same path, different value
    pub changed: Vec<Change<'a>>,
}

impl<'a> JsonDiff<'a> {
    /// Compute the diff from `left` to `right`.
    pub fn between(left: &'a Value, right: &'a Value) -> Self {
        let mut diff = JsonDiff::default();
        diff.walk("$".to_string(), left, right);
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn walk(&mut self, path: String, left: &'a Value, right: &'a Value) {
        match (left, right) {
            (Value::Object(l), Value::Object(r)) => {
                for (key, lv) in l {
                    let child = format!("{path}.{key}");
                    match r.get(key) {
                        Some(rv) => self.walk(child, lv, rv),
                        None => self.removed.push(DiffItem {
                            path: child,
                            value: lv,
                        }),
                    }
                }
                for (key, rv) in r {
                    if !l.contains_key(key) {
                        self.added.push(DiffItem {
                            path: format!("{path}.{key}"),
                            value: rv,
                        });
                    }
                }
            }
            (Value::Array(l), Value::Array(r)) => self.walk_unordered(&path, l, r),
            _ if left == right => {}
            _ => self.changed.push(Change { path, left, right }),
        }
    }

    fn walk_unordered(&mut self, path: &str, left: &'a [Value], right: &'a [Value]) {
        let mut paired = vec![false; right.len()];
        for (i, lv) in left.iter().enumerate() {
            let partner = right
                .iter()
                .enumerate()
                .position(|(j, rv)| !paired[j] && rv == lv);
            match partner {
                Some(j) => paired[j] = true,
                None => self.removed.push(DiffItem {
                    path: format!("{path}[{i}]"),
                    value: lv,
                }),
            }
        }
        for (j, rv) in right.iter().enumerate() {
            if !paired[j] {
                self.added.push(DiffItem {
                    path: format!("{path}[{j}]"),
                    value: rv,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents() {
        let doc = json!({"a": 1, "b": [1, 2, {"c": null}]});
        assert!(JsonDiff::between(&doc, &doc).is_empty());
    }

    #[test]
    fn test_added_and_removed_keys() {
        let left = json!({"a": 1, "b": 2});
        let right = json!({"a": 1, "c": 3});
        let diff = JsonDiff::between(&left, &right);

        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].path, "$.b");
        assert_eq!(diff.removed[0].value, &json!(2));
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].path, "$.c");
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn test_changed_nested_value() {
        let left = json!({"user": {"name": "ada", "age": 36}});
        let right = json!({"user": {"name": "ada", "age": 37}});
        let diff = JsonDiff::between(&left, &right);

        assert_eq!(diff.changed.len(), 1);
        assert_eq!(diff.changed[0].path, "$.user.age");
    }

    #[test]
    fn test_type_change_is_a_change() {
        let left = json!({"id": 1});
        let right = json!({"id": "1"});
        let diff = JsonDiff::between(&left, &right);
        assert_eq!(diff.changed.len(), 1);
    }

    #[test]
    fn test_integer_and_float_are_distinct() {
        let left = json!({"n": 1});
        let right = json!({"n": 1.0});
        assert_eq!(JsonDiff::between(&left, &right).changed.len(), 1);
    }

    #[test]
    fn test_arrays_ignore_order() {
        let left = json!([1, 2, 3]);
        let right = json!([3, 1, 2]);
        assert!(JsonDiff::between(&left, &right).is_empty());
    }

    #[test]
    fn test_arrays_are_multisets() {
        let left = json!([1, 1, 2]);
        let right = json!([1, 2, 2]);
        let diff = JsonDiff::between(&left, &right);

        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].path, "$[1]");
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].path, "$[2]");
    }

    #[test]
    fn test_root_scalar_change() {
        let left = json!("a");
        let right = json!("b");
        let diff = JsonDiff::between(&left, &right);
        assert_eq!(diff.changed[0].path, "$");
    }
}
