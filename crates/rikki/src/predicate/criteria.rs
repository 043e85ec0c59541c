//! Request and response criteria.
//!
//! The same structures describe what to match (criteria) and what to
//! substitute (overlays). Every field is optional; an unset field and an
//! explicit `null` mean the same thing.

use super::comparator::Content;
use super::field_matcher::FieldMap;
use serde::{Deserialize, Serialize};

/// Optional constraints on (or replacements for) request fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestCriterion {
    /// Host regex, fully anchored. As an overlay, the literal new host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Path component only, without query string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Query parameters (containment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<FieldMap>,

    /// Request headers (containment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<FieldMap>,

    /// Request body, compared with the value comparator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

impl RequestCriterion {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.method.is_none()
            && self.path.is_none()
            && self.params.is_none()
            && self.headers.is_none()
            && self.content.is_none()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(FieldMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(FieldMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Optional constraints on (or replacements for) response fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCriterion {
    /// Status code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    /// Response headers (containment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<FieldMap>,

    /// Response body, loose text equality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

impl ResponseCriterion {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.headers.is_none() && self.content.is_none()
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(FieldMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<Content>) -> Self {
        self.content = Some(content.into());
        self
    }
}

// Overlays share the criterion shape
pub type RequestOverlay = RequestCriterion;
pub type ResponseOverlay = ResponseCriterion;
