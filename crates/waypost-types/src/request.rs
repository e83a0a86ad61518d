//! Transport-independent request and response objects.

use serde::Serialize;
use serde_json::Value;

/// An inbound request as the dispatcher sees it.
///
/// The transport layer builds one of these per request; the router only
/// ever looks at the method, the path, and the headers. The body is
/// carried through to handlers as opaque bytes and is never parsed here.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// The verb exactly as it arrived on the wire.
    pub method: String,
    /// Request path with the query string already stripped.
    pub path: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Raw request body, untouched.
    pub body: Vec<u8>,
}

impl RouteRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Look up a header by name, case-insensitive per RFC 7230. Returns the
    /// first occurrence.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A handler's result, handed back to the transport unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing)]
    pub body: Vec<u8>,
}

impl RouteResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A JSON response with the content type already set.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    /// A plain-text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: body.into().into_bytes(),
        }
    }

    /// The stock "no route" response produced by the built-in default
    /// handler.
    pub fn not_found() -> Self {
        Self::json(404, &serde_json::json!({ "error": "no route" }))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
