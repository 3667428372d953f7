//! Capabilities the resource layer needs from an OAuth client

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sceneid_auth::{OAuthClient, Result, SessionStore};
use transport::Method;

/// Refresh-aware request dispatch plus format unpacking.
///
/// Uses `Pin<Box<dyn Future>>` so the trait stays dyn-compatible.
pub trait ResourceDispatch: Send + Sync {
    /// Absolute URL for a resource path such as `/me/`.
    fn resource_url(&self, path: &str) -> String;

    /// GET `url` with Bearer auth, refreshing once on `invalid_token`.
    fn request_with_refresh<'a>(
        &'a self,
        url: String,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Decode a body according to the negotiated format.
    fn unpack_format(&self, body: &str) -> Result<serde_json::Value>;

    /// Drop every token and state association.
    fn reset_storage(&mut self);
}

impl ResourceDispatch for OAuthClient {
    fn resource_url(&self, path: &str) -> String {
        OAuthClient::resource_url(self, path)
    }

    fn request_with_refresh<'a>(
        &'a self,
        url: String,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.authenticated_request_with_refresh(Some(&url), Method::Get, &[])
                .await
        })
    }

    fn unpack_format(&self, body: &str) -> Result<serde_json::Value> {
        OAuthClient::unpack_format(self, body)
    }

    fn reset_storage(&mut self) {
        self.set_storage(Arc::new(SessionStore::new()));
    }
}
