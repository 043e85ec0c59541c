//! Criteria and matching over captured exchanges.
//!
//! # Module Structure
//!
//! - `criteria` - Request/response criteria (also used as overlays)
//! - `comparator` - Content-aware comparison (loose text, JSON subset)
//! - `json_diff` - Structural JSON diff with order-insensitive arrays
//! - `matcher` - Case-folded text equality
//! - `field_matcher` - Header and query parameter containment
//! - `request` - Compiled request criterion
//! - `response` - Compiled response criterion

mod comparator;
mod criteria;
mod field_matcher;
mod json_diff;
mod matcher;
mod request;
mod response;

pub use comparator::{compare, json_contains, Content, Payload, JSON_SUBSET_MARKER};
pub use criteria::{RequestCriterion, RequestOverlay, ResponseCriterion, ResponseOverlay};
pub use field_matcher::{contains, first_unmet, FieldMap};
pub use json_diff::{Change, DiffItem, JsonDiff};
pub use matcher::{fold, text_equals, FoldedText};
pub use request::{compile_anchored, CompiledRequestCriterion};
pub use response::CompiledResponseCriterion;
