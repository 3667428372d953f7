//! Production transport backed by `reqwest`
//!
//! Builds one `reqwest::Client` with the configured timeout and follows
//! redirects (the SceneID endpoints answer with trailing-slash redirects).
//! A timeout surfaces as `TransportError::Timeout`; the OAuth client never
//! retries it.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::{HttpRequest, HttpResponse, Method, Result, Transport, TransportError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// `Transport` over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests give up after `timeout`.
    ///
    /// Fails with `Unavailable` when the TLS backend or resolver cannot be
    /// initialized.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
    }
}

fn build_headers(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_str(name)
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name}: {e}")))?;
        // The value may be a bearer token, keep it out of the message
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout(error.to_string());
    }
    TransportError::Request(error.to_string())
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let mut headers = build_headers(&request.headers)?;
            let mut builder = self
                .client
                .request(to_reqwest_method(request.method), &request.url);

            if let Some(body) = request.body {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                builder = builder.body(body);
            }

            debug!(method = %request.method, url = %request.url, "sending request");

            let response = builder.headers(headers).send().await.map_err(map_error)?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            debug!(status, bytes = body.len(), "received response");
            Ok(HttpResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_timeout() {
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        assert_eq!(transport.id(), "reqwest");
    }

    #[test]
    fn header_values_are_validated() {
        let ok = build_headers(&[("Authorization".into(), "Bearer at_1".into())]).unwrap();
        assert_eq!(ok.get("authorization").unwrap(), "Bearer at_1");

        let bad_name = build_headers(&[("bad header".into(), "x".into())]);
        assert!(matches!(bad_name, Err(TransportError::InvalidRequest(_))));

        let bad_value = build_headers(&[("Authorization".into(), "Bearer\nx".into())]);
        assert!(matches!(bad_value, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn methods_map_to_reqwest() {
        assert_eq!(to_reqwest_method(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(Method::Post), reqwest::Method::POST);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        // Port 9 on localhost is the discard port and is closed on test hosts
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let result = transport
            .execute(HttpRequest {
                method: Method::Get,
                url: "http://127.0.0.1:9/me/?format=json".into(),
                headers: vec![],
                body: None,
            })
            .await;
        assert!(
            matches!(
                result,
                Err(TransportError::Request(_)) | Err(TransportError::Timeout(_))
            ),
            "closed port must fail below HTTP"
        );
    }
}
