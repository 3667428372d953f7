//! Scripted in-memory transport
//!
//! Replays queued responses in order and records every request it receives,
//! so tests can assert on call counts, headers, and form bodies without a
//! network. Running out of responses is a `TransportError::Request`.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use crate::{HttpRequest, HttpResponse, Result, Transport, TransportError};

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with an explicit status.
    pub fn push(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(HttpResponse::new(status, body));
        self
    }

    /// Queue a 200 response.
    pub fn push_ok(&self, body: impl Into<String>) -> &Self {
        self.push(200, body)
    }

    /// Snapshot of every request executed so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of requests whose form body carries `grant_type=<grant>`.
    pub fn grant_count(&self, grant: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.form_value("grant_type").as_deref() == Some(grant))
            .count()
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send + 'a>> {
        let url = request.url.clone();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        Box::pin(async move {
            next.ok_or_else(|| TransportError::Request(format!("no scripted response for {url}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: url.into(),
            headers: vec![],
            body: None,
        }
    }

    #[tokio::test]
    async fn replays_in_order_and_records() {
        let transport = ScriptedTransport::new();
        transport.push_ok(r#"{"id":1}"#).push(401, r#"{"error":"invalid_token"}"#);

        let first = transport.execute(get("https://a/1")).await.unwrap();
        let second = transport.execute(get("https://a/2")).await.unwrap();

        assert_eq!(first.status, 200);
        assert_eq!(first.body, r#"{"id":1}"#);
        assert_eq!(second.status, 401);
        assert_eq!(transport.request_count(), 2);
        assert_eq!(transport.requests()[1].url, "https://a/2");
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_script_is_an_error() {
        let transport = ScriptedTransport::new();
        let result = transport.execute(get("https://a/me/")).await;
        assert!(matches!(result, Err(TransportError::Request(_))));
        // The failed attempt is still recorded
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn counts_grants_by_form_body() {
        let transport = ScriptedTransport::new();
        transport.push_ok("{}").push_ok("{}");
        for grant in ["refresh_token", "client_credentials"] {
            transport
                .execute(HttpRequest {
                    method: Method::Post,
                    url: "https://a/token".into(),
                    headers: vec![],
                    body: Some(format!("grant_type={grant}")),
                })
                .await
                .unwrap();
        }
        assert_eq!(transport.grant_count("refresh_token"), 1);
        assert_eq!(transport.grant_count("authorization_code"), 0);
    }
}
