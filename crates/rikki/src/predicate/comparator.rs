//! Content-aware value comparison.
//!
//! `compare(left, right)` answers whether `right` carries everything `left`
//! asks for. Text is compared loosely (trimmed, case folded). JSON is
//! compared structurally: `right` may add keys and array items, but must not
//! drop or change anything `left` names. A text `left` opts into JSON
//! semantics with a leading `?` marker: `?{...}` or `?[...]`.

use super::json_diff::JsonDiff;
use super::matcher::text_equals;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Marker prefix that switches text comparison to JSON-subset comparison.
pub const JSON_SUBSET_MARKER: char = '?';

/// Expected content as written by an operator: plain text or a JSON document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Json(Value),
}

impl Content {
    pub fn as_payload(&self) -> Payload<'_> {
        match self {
            Content::Text(text) => Payload::Text(text),
            Content::Json(value) => Payload::Json(value),
        }
    }

    /// Render as body text. JSON documents are rendered compactly.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Content::Text(text) => Cow::Borrowed(text),
            Content::Json(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content::Json(value)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    Text(&'a str),
    /// Raw bytes, decoded as UTF-8 before comparison
    Bytes(&'a [u8]),
    Json(&'a Value),
    Absent,
}

/// Payload after byte decoding.
enum Decoded<'a> {
    Text(&'a str),
    Json(&'a Value),
    Absent,
}

impl<'a> Payload<'a> {
    fn decode(self) -> Option<Decoded<'a>> {
        match self {
            Payload::Text(text) => Some(Decoded::Text(text)),
            Payload::Bytes(bytes) => std::str::from_utf8(bytes).ok().map(Decoded::Text),
            Payload::Json(value) => Some(Decoded::Json(value)),
            Payload::Absent => Some(Decoded::Absent),
        }
    }
}

/// Strip the JSON-subset marker if `text` starts with `?{` or `?[`.
fn strip_marker(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(JSON_SUBSET_MARKER)?;
    (rest.starts_with('{') || rest.starts_with('[')).then_some(rest)
}

/// Render a JSON value for loose text comparison; strings use their contents.
fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Does `right` contain everything meant by `left`?
///
/// Never fails: undecodable bytes and unparseable JSON resolve to `false` or
/// to the text fallback respectively.
pub fn compare(left: Payload<'_>, right: Payload<'_>) -> bool {
    let (left, right) = match (left.decode(), right.decode()) {
        (Some(l), Some(r)) => (l, r),
        _ => return false,
    };

    match (left, right) {
        (Decoded::Absent, Decoded::Absent) => true,
        (Decoded::Absent, _) | (_, Decoded::Absent) => false,
        (Decoded::Json(l), Decoded::Json(r)) => json_contains(l, r),
        (Decoded::Text(l), Decoded::Text(r)) => match strip_marker(l) {
            Some(stripped) => {
                match (
                    serde_json::from_str::<Value>(stripped),
                    serde_json::from_str::<Value>(r),
                ) {
                    (Ok(lv), Ok(rv)) => json_contains(&lv, &rv),
                    _ => text_equals(stripped, r),
                }
            }
            None => text_equals(l, r),
        },
        (Decoded::Json(l), Decoded::Text(r)) => match serde_json::from_str::<Value>(r) {
            Ok(rv) => json_contains(l, &rv),
            Err(_) => text_equals(&render(l), r),
        },
        (Decoded::Text(l), Decoded::Json(r)) => {
            match strip_marker(l).map(serde_json::from_str::<Value>) {
                Some(Ok(lv)) => json_contains(&lv, r),
                Some(Err(_)) => text_equals(&l[1..], &render(r)),
                None => text_equals(l, &render(r)),
            }
        }
    }
}

/// JSON-subset check between two parsed documents.
///
/// Changed values always fail. Every removed item must be matched by some
/// added item that itself compares equal, which tolerates renamed keys
/// carrying identical values.
pub fn json_contains(left: &Value, right: &Value) -> bool {
    let diff = JsonDiff::between(left, right);
    if !diff.changed.is_empty() {
        return false;
    }
    diff.removed.iter().all(|removed| {
        diff.added
            .iter()
            .any(|added| compare(Payload::Json(removed.value), Payload::Json(added.value)))
    })
}
