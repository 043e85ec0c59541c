//! Compiled request criterion.

use super::comparator::{compare, Content, Payload};
use super::criteria::RequestCriterion;
use super::field_matcher::{first_unmet, FieldMap};
use crate::error::FilterError;
use crate::exchange::Request;
use regex::Regex;
use tracing::trace;

/// Request criterion compiled for repeated evaluation.
///
/// The host pattern is compiled once, anchored at both ends.
#[derive(Debug, Clone)]
pub struct CompiledRequestCriterion {
    pub host: Option<Regex>,
    pub port: Option<u16>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub params: Option<FieldMap>,
    pub headers: Option<FieldMap>,
    pub content: Option<Content>,
}

/// Compile `pattern` so it only matches a whole string.
///
/// The bare pattern must compile on its own, so unbalanced groups cannot
/// break out of the anchoring wrapper.
pub fn compile_anchored(pattern: &str) -> Result<Regex, FilterError> {
    let invalid = |source: regex::Error| FilterError::InvalidHost {
        pattern: pattern.to_string(),
        source,
    };
    Regex::new(pattern).map_err(invalid)?;
    Regex::new(&format!(r"\A(?:{pattern})\z")).map_err(invalid)
}

fn reject(field: &'static str) -> bool {
    trace!(field, "request criterion rejected exchange");
    false
}

impl CompiledRequestCriterion {
    /// Compile a RequestCriterion.
    pub fn compile(criterion: &RequestCriterion) -> Result<Self, FilterError> {
        let host = criterion
            .host
            .as_deref()
            .map(compile_anchored)
            .transpose()?;

        Ok(CompiledRequestCriterion {
            host,
            port: criterion.port,
            method: criterion.method.clone(),
            path: criterion.path.clone(),
            params: criterion.params.clone(),
            headers: criterion.headers.clone(),
            content: criterion.content.clone(),
        })
    }

    /// Check every set field against `request`, stopping at the first mismatch.
    pub fn matches(&self, request: &Request) -> bool {
        if let Some(port) = self.port {
            if request.port != port {
                return reject("port");
            }
        }

        if let Some(path) = &self.path {
            if request.path_component() != path {
                return reject("path");
            }
        }

        if let Some(method) = &self.method {
            if request.method != *method {
                return reject("method");
            }
        }

        if let Some(host) = &self.host {
            let by_host = host.is_match(&request.host);
            if !by_host && !request.host_header().is_some_and(|h| host.is_match(h)) {
                return reject("host");
            }
        }

        if let Some(params) = &self.params {
            if let Some(key) = first_unmet(&request.query, params) {
                trace!(key, "missing query parameter");
                return reject("params");
            }
        }

        if let Some(headers) = &self.headers {
            if let Some(key) = first_unmet(&request.headers, headers) {
                trace!(key, "missing request header");
                return reject("headers");
            }
        }

        if let Some(content) = &self.content {
            // Undecodable bodies never match
            let body = match request.text() {
                Ok(body) => body,
                Err(_) => return reject("content"),
            };
            if !compare(content.as_payload(), Payload::Text(body)) {
                return reject("content");
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new("POST", "10.0.0.5", 8443, "/v1/users?page=2&tag=a&tag=b")
            .with_header("Host", "api.example.com")
            .with_header("Accept", "application/json")
            .with_body(r#"{"name":"ada","roles":["admin","dev"]}"#)
    }

    fn compiled(criterion: RequestCriterion) -> CompiledRequestCriterion {
        CompiledRequestCriterion::compile(&criterion).unwrap()
    }

    #[test]
    fn test_empty_criterion_matches() {
        assert!(compiled(RequestCriterion::default()).matches(&request()));
    }

    #[test]
    fn test_port_and_method() {
        assert!(compiled(RequestCriterion::default().with_port(8443)).matches(&request()));
        assert!(!compiled(RequestCriterion::default().with_port(443)).matches(&request()));
        assert!(compiled(RequestCriterion::default().with_method("POST")).matches(&request()));
        assert!(!compiled(RequestCriterion::default().with_method("post")).matches(&request()));
    }

    #[test]
    fn test_path_ignores_query() {
        assert!(compiled(RequestCriterion::default().with_path("/v1/users")).matches(&request()));
        assert!(!compiled(RequestCriterion::default().with_path("/v1/users?page=2"))
            .matches(&request()));
    }

    #[test]
    fn test_host_is_anchored() {
        assert!(compiled(RequestCriterion::default().with_host(r"10\.0\.0\.\d+"))
            .matches(&request()));
        // Substring of the host is not enough
        assert!(!compiled(RequestCriterion::default().with_host(r"0\.0")).matches(&request()));
        // Alternation stays anchored as a whole
        assert!(!compiled(RequestCriterion::default().with_host("x|0.0")).matches(&request()));
    }

    #[test]
    fn test_host_falls_back_to_host_header() {
        assert!(compiled(RequestCriterion::default().with_host(r"api\.example\.com"))
            .matches(&request()));
        assert!(!compiled(RequestCriterion::default().with_host(r"other\.example\.com"))
            .matches(&request()));
    }

    #[test]
    fn test_invalid_host_pattern() {
        let err = CompiledRequestCriterion::compile(&RequestCriterion::default().with_host("(["))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidHost { ref pattern, .. } if pattern == "(["));
    }

    #[test]
    fn test_unbalanced_group_cannot_escape_anchors() {
        // Valid once wrapped as `\A(?:e)|(zzz)\z`, invalid on its own
        let err = compile_anchored("e)|(zzz").unwrap_err();
        assert!(matches!(err, FilterError::InvalidHost { ref pattern, .. } if pattern == "e)|(zzz"));

        let evil = Request::new("GET", "evil.attacker.net", 443, "/");
        let exchanges = vec![crate::exchange::Exchange::new(evil)];
        let criterion = RequestCriterion::default().with_host("e)|(zzz");
        assert!(crate::filter::filter(&exchanges, Some(&criterion), None).is_err());
    }

    #[test]
    fn test_params_and_headers() {
        let criterion = RequestCriterion::default()
            .with_param("tag", "b")
            .with_header("accept", "application/json");
        assert!(compiled(criterion).matches(&request()));

        let criterion = RequestCriterion::default().with_param("tag", "c");
        assert!(!compiled(criterion).matches(&request()));
    }

    #[test]
    fn test_content_json_subset() {
        let criterion = RequestCriterion::default().with_content(r#"?{"roles":["dev"]}"#);
        assert!(compiled(criterion).matches(&request()));

        let criterion = RequestCriterion::default().with_content(r#"?{"roles":["ops"]}"#);
        assert!(!compiled(criterion).matches(&request()));
    }

    #[test]
    fn test_content_rejects_binary_body() {
        let binary = Request::new("PUT", "example.com", 80, "/").with_body(vec![0xc3, 0x28]);
        let criterion = RequestCriterion::default().with_content("anything");
        assert!(!compiled(criterion).matches(&binary));

        // Without a content criterion the body is never decoded
        assert!(compiled(RequestCriterion::default().with_method("PUT")).matches(&binary));
    }
}
