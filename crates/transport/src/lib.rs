//! HTTP transport abstraction for the SceneID client
//!
//! The OAuth client never talks to `reqwest` directly. It builds an
//! `HttpRequest` (method, URL, headers, form body) and hands it to a
//! `Transport`, which returns the status and raw body text. Body
//! interpretation (token replies, resource payloads) stays with the caller.
//!
//! `ReqwestTransport` is the production implementation. With the
//! `test-util` feature, `ScriptedTransport` replays canned responses and
//! records every request, and `HttpRequest` gains form/query decoders.

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use client::ReqwestTransport;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedTransport;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// HTTP methods used against the SceneID endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built outbound request.
///
/// `url` already carries its query string. `body` is a form-urlencoded
/// payload for POST requests.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(any(test, feature = "test-util"))]
impl HttpRequest {
    /// Decode a field from the form-urlencoded body.
    pub fn form_value(&self, key: &str) -> Option<String> {
        let body = self.body.as_deref()?;
        decode_pairs(body, key)
    }

    /// Decode a parameter from the URL query string.
    pub fn query_value(&self, key: &str) -> Option<String> {
        let (_, query) = self.url.split_once('?')?;
        decode_pairs(query, key)
    }
}

#[cfg(any(test, feature = "test-util"))]
fn decode_pairs(encoded: &str, key: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded).ok()?;
    pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// Status code and raw body text of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer. These are never retried by the client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP client unavailable: {0}")]
    Unavailable(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("reading response body failed: {0}")]
    Body(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Executes HTTP requests on behalf of the OAuth client.
///
/// Uses `Pin<Box<dyn Future>>` return types so the client can hold an
/// `Arc<dyn Transport>` and swap implementations at runtime.
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest", "scripted")
    fn id(&self) -> &str;

    /// Send the request and return the status and body, whatever the status.
    ///
    /// Non-2xx responses are not errors at this layer: the token endpoint
    /// reports grant failures as 400 responses with a JSON error body.
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>>;
}
