//! Error types for criterion compilation and rewriting.

/// Errors raised while compiling criteria into a filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid host pattern '{pattern}': {source}")]
    InvalidHost {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while validating an overlay. Nothing is applied when one is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RewriteError {
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: &'static str },
    #[error("Host overlay must not be empty")]
    EmptyHost,
    #[error("Invalid path overlay '{0}': fragments and control characters are not allowed")]
    InvalidPath(String),
    #[error("Invalid status code {0}")]
    InvalidStatus(u16),
}

/// Errors raised while compiling a rule set.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Rule '{rule}': {source}")]
    Filter {
        rule: String,
        #[source]
        source: FilterError,
    },
    #[error("Rule '{rule}': {source}")]
    Overlay {
        rule: String,
        #[source]
        source: RewriteError,
    },
}
