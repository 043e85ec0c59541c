//! Case-folded text comparison shared by the comparator and response matching.

/// Normalize text for loose comparison: trim surrounding whitespace and lowercase.
#[inline]
pub fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Loose text equality: whitespace-trimmed, case-folded.
pub fn text_equals(left: &str, right: &str) -> bool {
    fold(left) == fold(right)
}

/// An expected text value with its folded form computed once.
///
/// Avoids re-folding the expected side on every match against a stream of
/// exchanges.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedText {
    /// Original value
    pub value: String,
    /// Trimmed, lowercased value
    pub folded: String,
}

impl FoldedText {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let folded = fold(&value);
        Self { value, folded }
    }

    /// Check loose equality against an actual value.
    #[inline]
    pub fn matches(&self, actual: &str) -> bool {
        fold(actual) == self.folded
    }
}

impl From<String> for FoldedText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for FoldedText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
