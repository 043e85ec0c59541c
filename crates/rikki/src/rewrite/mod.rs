//! Overlay substitution on captured exchanges.
//!
//! An overlay replaces every field it sets and leaves the rest alone. The
//! overlay is validated up front, so an exchange is either fully rewritten
//! or not touched at all.
//!
//! Field order is fixed and later assignments win:
//! - request: host, port, method, path (its query merges into params),
//!   headers, params, content
//! - response: headers, content (and its derived Content-Type), code

pub mod content_type;

use crate::error::RewriteError;
use crate::exchange::{Exchange, MultiMap, Request, Response};
use crate::predicate::{FieldMap, RequestOverlay, ResponseOverlay};
use bytes::Bytes;
use tracing::debug;

pub const CONTENT_TYPE: &str = "Content-Type";

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

fn validate_headers(headers: Option<&FieldMap>) -> Result<(), RewriteError> {
    for (name, value) in headers.into_iter().flatten() {
        if name.is_empty() {
            return Err(RewriteError::InvalidHeader {
                name: name.clone(),
                reason: "empty name",
            });
        }
        if !name.chars().all(is_token_char) {
            return Err(RewriteError::InvalidHeader {
                name: name.clone(),
                reason: "name is not an HTTP token",
            });
        }
        if value.contains(['\r', '\n', '\0']) {
            return Err(RewriteError::InvalidHeader {
                name: name.clone(),
                reason: "value contains a control character",
            });
        }
    }
    Ok(())
}

/// Check that an overlay can be applied without leaving an exchange half rewritten.
pub fn validate(
    request: Option<&RequestOverlay>,
    response: Option<&ResponseOverlay>,
) -> Result<(), RewriteError> {
    if let Some(request) = request {
        if request.host.as_deref().is_some_and(str::is_empty) {
            return Err(RewriteError::EmptyHost);
        }
        if let Some(path) = &request.path {
            if path.contains(['#', '\r', '\n', '\0']) {
                return Err(RewriteError::InvalidPath(path.clone()));
            }
        }
        validate_headers(request.headers.as_ref())?;
    }
    if let Some(response) = response {
        validate_headers(response.headers.as_ref())?;
        if let Some(code) = response.code {
            if !(100..=999).contains(&code) {
                return Err(RewriteError::InvalidStatus(code));
            }
        }
    }
    Ok(())
}

fn overlay_fields(target: &mut MultiMap, fields: &FieldMap) {
    for (name, value) in fields {
        target.set_all(name.clone(), vec![value.clone()]);
    }
}

fn apply_request(request: &mut Request, overlay: &RequestOverlay) {
    if let Some(host) = &overlay.host {
        request.host = host.clone();
    }
    if let Some(port) = overlay.port {
        request.port = port;
    }
    if let Some(method) = &overlay.method {
        request.method = method.clone();
    }
    if let Some(path) = &overlay.path {
        request.set_target(path);
    }
    if let Some(headers) = &overlay.headers {
        overlay_fields(&mut request.headers, headers);
    }
    if let Some(params) = &overlay.params {
        overlay_fields(&mut request.query, params);
        request.sync_query_string();
    }
    if let Some(content) = &overlay.content {
        // Request Content-Type stays under operator control
        request.body = Bytes::from(content.to_text().into_owned());
    }
}

fn apply_response(response: &mut Response, overlay: &ResponseOverlay) {
    if let Some(headers) = &overlay.headers {
        overlay_fields(&mut response.headers, headers);
    }
    if let Some(content) = &overlay.content {
        let body = content.to_text();
        response
            .headers
            .insert(CONTENT_TYPE, content_type::derive(&body));
        response.body = Bytes::from(body.into_owned());
    }
    if let Some(code) = overlay.code {
        response.status = code;
    }
}

/// Apply overlays to `exchange` in place.
///
/// A response overlay on an exchange without a response is skipped.
pub fn rewrite(
    exchange: &mut Exchange,
    request: Option<&RequestOverlay>,
    response: Option<&ResponseOverlay>,
) -> Result<(), RewriteError> {
    validate(request, response)?;

    if let Some(overlay) = request {
        apply_request(&mut exchange.request, overlay);
    }
    if let Some(overlay) = response {
        match exchange.response.as_mut() {
            Some(target) => apply_response(target, overlay),
            None => debug!(
                path = %exchange.request.path,
                "no response captured yet, skipping response overlay"
            ),
        }
    }
    Ok(())
}

/// Apply overlays to a copy of `exchange`.
pub fn rewritten(
    exchange: &Exchange,
    request: Option<&RequestOverlay>,
    response: Option<&ResponseOverlay>,
) -> Result<Exchange, RewriteError> {
    let mut copy = exchange.clone();
    rewrite(&mut copy, request, response)?;
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{RequestCriterion, ResponseCriterion};
    use serde_json::json;

    fn exchange() -> Exchange {
        Exchange::new(
            Request::new("GET", "api.example.com", 443, "/v1/items?page=1&tag=a&tag=b")
                .with_header("Accept", "text/html")
                .with_header("Accept", "application/json")
                .with_body("original"),
        )
        .with_response(
            Response::new(200)
                .with_header("Content-Type", "text/html")
                .with_header("Server", "nginx")
                .with_body("<p>hi</p>"),
        )
    }

    #[test]
    fn test_request_host_and_content() {
        let overlay = RequestCriterion::default()
            .with_host("staging.example.com")
            .with_content(r#"{"x":1}"#);
        let out = rewritten(&exchange(), Some(&overlay), None).unwrap();

        assert_eq!(out.request.host, "staging.example.com");
        assert_eq!(out.request.body, Bytes::from_static(br#"{"x":1}"#));
        // Request Content-Type is never derived
        assert!(!out.request.headers.contains_key("Content-Type"));
        assert_eq!(out.response, exchange().response);
    }

    #[test]
    fn test_request_headers_replace_all_values() {
        let overlay = RequestCriterion::default().with_header("accept", "*/*");
        let out = rewritten(&exchange(), Some(&overlay), None).unwrap();
        assert_eq!(out.request.headers.get_all("Accept"), ["*/*"]);
    }

    #[test]
    fn test_params_replace_and_update_path() {
        let overlay = RequestCriterion::default()
            .with_param("tag", "c")
            .with_param("lang", "en");
        let out = rewritten(&exchange(), Some(&overlay), None).unwrap();

        assert_eq!(out.request.query.get_all("tag"), ["c"]);
        assert_eq!(out.request.query.get_all("page"), ["1"]);
        assert_eq!(out.request.path, "/v1/items?page=1&tag=c&lang=en");
    }

    #[test]
    fn test_path_port_method() {
        let overlay = RequestCriterion::default()
            .with_path("/v2/items")
            .with_port(8080)
            .with_method("HEAD");
        let out = rewritten(&exchange(), Some(&overlay), None).unwrap();

        assert_eq!(out.request.path, "/v2/items?page=1&tag=a&tag=b");
        assert_eq!(out.request.port, 8080);
        assert_eq!(out.request.method, "HEAD");
    }

    #[test]
    fn test_path_with_query_merges_params() {
        let overlay = RequestCriterion::default().with_path("/v2/items?tag=z&lang=en");
        let once = rewritten(&exchange(), Some(&overlay), None).unwrap();

        assert_eq!(once.request.path, "/v2/items?page=1&tag=z&lang=en");
        assert_eq!(once.request.query.get_all("tag"), ["z"]);
        assert_eq!(once.request.query.get("lang"), Some("en"));

        let twice = rewritten(&once, Some(&overlay), None).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_response_content_derives_content_type() {
        let overlay = ResponseCriterion::default().with_content(r#"{"ok":true}"#);
        let out = rewritten(&exchange(), None, Some(&overlay)).unwrap();
        let response = out.response.unwrap();

        assert_eq!(response.body, Bytes::from_static(br#"{"ok":true}"#));
        assert_eq!(response.headers.get_all("content-type"), [content_type::JSON]);
        assert_eq!(response.headers.get("Server"), Some("nginx"));
    }

    #[test]
    fn test_derived_content_type_wins_over_header_overlay() {
        let overlay = ResponseCriterion::default()
            .with_header("Content-Type", "application/xml")
            .with_content("plain words");
        let out = rewritten(&exchange(), None, Some(&overlay)).unwrap();
        assert_eq!(
            out.response.unwrap().headers.get("Content-Type"),
            Some(content_type::PLAIN)
        );
    }

    #[test]
    fn test_response_json_document_content() {
        let overlay = ResponseCriterion::default().with_content(json!({"items": []}));
        let out = rewritten(&exchange(), None, Some(&overlay)).unwrap();
        let response = out.response.unwrap();
        assert_eq!(response.text().unwrap(), r#"{"items":[]}"#);
        assert_eq!(response.headers.get("Content-Type"), Some(content_type::JSON));
    }

    #[test]
    fn test_response_code() {
        let overlay = ResponseCriterion::default().with_code(503);
        let out = rewritten(&exchange(), None, Some(&overlay)).unwrap();
        let response = out.response.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.text().unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_missing_response_is_skipped() {
        let mut pending = Exchange::new(Request::new("GET", "example.com", 80, "/"));
        let overlay = ResponseCriterion::default().with_code(500);
        rewrite(&mut pending, None, Some(&overlay)).unwrap();
        assert!(pending.response.is_none());
    }

    #[test]
    fn test_invalid_overlay_leaves_exchange_untouched() {
        let mut target = exchange();
        let request = RequestCriterion::default().with_host("changed.example.com");
        let response = ResponseCriterion::default().with_header("Bad Header", "x");

        let err = rewrite(&mut target, Some(&request), Some(&response)).unwrap_err();
        assert!(matches!(err, RewriteError::InvalidHeader { .. }));
        assert_eq!(target, exchange());
    }

    #[test]
    fn test_validation_errors() {
        let injected = RequestCriterion::default().with_header("X-Evil", "a\r\nb: c");
        assert!(matches!(
            validate(Some(&injected), None),
            Err(RewriteError::InvalidHeader { .. })
        ));

        let empty_host = RequestCriterion::default().with_host("");
        assert_eq!(validate(Some(&empty_host), None), Err(RewriteError::EmptyHost));

        let fragment = RequestCriterion::default().with_path("/a#top");
        assert_eq!(
            validate(Some(&fragment), None),
            Err(RewriteError::InvalidPath("/a#top".to_string()))
        );

        let bad_code = ResponseCriterion::default().with_code(42);
        assert_eq!(
            validate(None, Some(&bad_code)),
            Err(RewriteError::InvalidStatus(42))
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let request = RequestCriterion::default()
            .with_param("page", "9")
            .with_header("X-Debug", "1")
            .with_content("body");
        let response = ResponseCriterion::default()
            .with_content("<!DOCTYPE html><p>stub</p>")
            .with_code(418);

        let once = rewritten(&exchange(), Some(&request), Some(&response)).unwrap();
        let twice = rewritten(&once, Some(&request), Some(&response)).unwrap();
        assert_eq!(once, twice);
    }
}
