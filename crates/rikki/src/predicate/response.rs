//! Compiled response criterion.

use super::criteria::ResponseCriterion;
use super::field_matcher::{first_unmet, FieldMap};
use super::matcher::FoldedText;
use crate::exchange::Response;
use tracing::trace;

/// Response criterion compiled for repeated evaluation.
#[derive(Debug, Clone)]
pub struct CompiledResponseCriterion {
    pub code: Option<u16>,
    pub headers: Option<FieldMap>,
    pub content: Option<FoldedText>,
}

fn reject(field: &'static str) -> bool {
    trace!(field, "response criterion rejected exchange");
    false
}

impl CompiledResponseCriterion {
    pub fn compile(criterion: &ResponseCriterion) -> Self {
        CompiledResponseCriterion {
            code: criterion.code,
            headers: criterion.headers.clone(),
            content: criterion
                .content
                .as_ref()
                .map(|c| FoldedText::new(c.to_text())),
        }
    }

    /// Check every set field. An exchange without a response never matches.
    pub fn matches(&self, response: Option<&Response>) -> bool {
        let Some(response) = response else {
            return reject("response");
        };

        if let Some(code) = self.code {
            if response.status != code {
                return reject("code");
            }
        }

        if let Some(headers) = &self.headers {
            if let Some(key) = first_unmet(&response.headers, headers) {
                trace!(key, "missing response header");
                return reject("headers");
            }
        }

        if let Some(content) = &self.content {
            match response.text() {
                Ok(body) if content.matches(body) => {}
                _ => return reject("content"),
            }
        }

        true
    }
}
