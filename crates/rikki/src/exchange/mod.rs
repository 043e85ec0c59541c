//! Captured HTTP exchanges as seen by the host proxy.
//!
//! An [`Exchange`] pairs a [`Request`] with an optional [`Response`] (a flow
//! may be captured before its response arrives). Bodies are raw bytes; the
//! matcher decodes them as UTF-8 only when a content criterion asks for it.

mod body;
mod multimap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::str::Utf8Error;

pub use multimap::{deserialize_headers, MultiMap};

/// Captured HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RequestRecord")]
pub struct Request {
    pub method: String,
    pub host: String,
    pub port: u16,
    /// Request target; may include a query string.
    pub path: String,
    pub query: MultiMap,
    pub headers: MultiMap,
    #[serde(with = "body")]
    pub body: Bytes,
}

/// Wire form of a request; `query` is derived from `path` when omitted.
#[derive(Deserialize)]
struct RequestRecord {
    method: String,
    host: String,
    port: u16,
    path: String,
    #[serde(default)]
    query: Option<MultiMap>,
    #[serde(default = "MultiMap::headers", deserialize_with = "deserialize_headers")]
    headers: MultiMap,
    #[serde(default, with = "body")]
    body: Bytes,
}

impl From<RequestRecord> for Request {
    fn from(record: RequestRecord) -> Self {
        let query = match record.query {
            Some(query) => query,
            None => parse_query(split_path(&record.path).1.unwrap_or("")),
        };
        Request {
            method: record.method,
            host: record.host,
            port: record.port,
            path: record.path,
            query,
            headers: record.headers,
            body: record.body,
        }
    }
}

impl Request {
    /// Create a request; the query map is parsed from `path`.
    pub fn new(
        method: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let query = parse_query(split_path(&path).1.unwrap_or(""));
        Request {
            method: method.into(),
            host: host.into(),
            port,
            path,
            query,
            headers: MultiMap::headers(),
            body: Bytes::new(),
        }
    }

    /// Append a header value.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Path without the query string.
    pub fn path_component(&self) -> &str {
        split_path(&self.path).0
    }

    /// Raw query string, if the path carries one.
    pub fn query_string(&self) -> Option<&str> {
        split_path(&self.path).1
    }

    /// Value of the `Host` header, used when the proxy runs transparently.
    pub fn host_header(&self) -> Option<&str> {
        self.headers.get("Host")
    }

    /// Body decoded as UTF-8.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Replace the path component, keeping the current query string.
    pub fn set_path_component(&mut self, path: &str) {
        self.path = match self.query_string() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
    }

    /// Replace the request target. A query string in `target` overrides the
    /// matching keys of the query map; other parameters are kept.
    pub fn set_target(&mut self, target: &str) {
        let (path, query) = split_path(target);
        self.set_path_component(path);
        if let Some(query) = query {
            for (key, values) in parse_query(query).entries() {
                self.query.set_all(key, values.to_vec());
            }
            self.sync_query_string();
        }
    }

    /// Re-render the query string inside `path` from the query map.
    ///
    /// Parameters whose values did not change keep their original encoding.
    pub fn sync_query_string(&mut self) {
        let rendered = render_query(&self.query, self.query_string().unwrap_or(""));
        let path = self.path_component();
        self.path = if rendered.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{rendered}")
        };
    }
}

/// Captured HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default = "MultiMap::headers", deserialize_with = "deserialize_headers")]
    pub headers: MultiMap,
    #[serde(default, with = "body")]
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Response {
            status,
            headers: MultiMap::headers(),
            body: Bytes::new(),
        }
    }

    /// Append a header value.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Body decoded as UTF-8.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// A request together with its response, if one has been captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
}

impl Exchange {
    pub fn new(request: Request) -> Self {
        Exchange {
            request,
            response: None,
        }
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }
}

/// Split a request target into path and query string.
fn split_path(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Parse a query string into a case-sensitive multi-map.
///
/// Keys and values are percent-decoded and `+` is read as a space.
pub fn parse_query(query: &str) -> MultiMap {
    let mut params = MultiMap::query();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.append(decode_component(key), decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Render a query multi-map back into a query string.
///
/// Keys whose decoded values still equal those found in `raw` are copied
/// from `raw` verbatim (bare `flag`, `+` for spaces). Every other key is
/// percent-encoded. Pairs come out grouped by key in map order.
pub fn render_query(query: &MultiMap, raw: &str) -> String {
    let raw_pairs: Vec<(String, String, &str)> = raw
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value), pair)
        })
        .collect();

    let mut rendered = Vec::new();
    for (key, values) in query.entries() {
        let original: Vec<&(String, String, &str)> =
            raw_pairs.iter().filter(|(k, _, _)| k == key).collect();
        let unchanged = original.len() == values.len()
            && original.iter().zip(values).all(|((_, v, _), value)| v == value);
        if unchanged {
            rendered.extend(original.iter().map(|(_, _, pair)| pair.to_string()));
        } else {
            rendered.extend(values.iter().map(|value| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            }));
        }
    }
    rendered.join("&")
}
