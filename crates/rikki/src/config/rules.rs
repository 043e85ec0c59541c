//! Rule definitions: criteria to select exchanges and an overlay to apply.

use crate::predicate::{RequestCriterion, RequestOverlay, ResponseCriterion, ResponseOverlay};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Rule {
    pub name: String,
    /// Request side of the match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestCriterion>,
    /// Response side of the match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseCriterion>,
    /// Substitution applied to matching exchanges
    #[serde(default)]
    pub overlay: Overlay,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Overlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestOverlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseOverlay>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.request.as_ref().map_or(true, RequestOverlay::is_empty)
            && self.response.as_ref().map_or(true, ResponseOverlay::is_empty)
    }
}
