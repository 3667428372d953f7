//! Named SceneID API calls

use sceneid_auth::{OAuthClient, Result};
use tracing::debug;

use crate::dispatch::ResourceDispatch;

/// SceneID API client.
///
/// Wraps a dispatcher (normally an `OAuthClient`) and exposes the
/// domain calls. All calls use the refresh-aware request path.
pub struct ResourceClient<D = OAuthClient> {
    dispatch: D,
}

impl<D: ResourceDispatch> ResourceClient<D> {
    pub fn new(dispatch: D) -> Self {
        Self { dispatch }
    }

    pub fn client(&self) -> &D {
        &self.dispatch
    }

    /// Mutable access for scope/format/storage changes.
    pub fn client_mut(&mut self) -> &mut D {
        &mut self.dispatch
    }

    pub fn into_inner(self) -> D {
        self.dispatch
    }

    /// Look up a user by numeric id (`/user/?id=<id>`).
    pub async fn fetch_user_by_id(&self, id: u64) -> Result<serde_json::Value> {
        debug!(user_id = id, "fetching user");
        self.fetch(&format!("/user/?id={id}")).await
    }

    /// Fetch the user the current token belongs to (`/me/`).
    pub async fn fetch_current_user(&self) -> Result<serde_json::Value> {
        debug!("fetching current user");
        self.fetch("/me/").await
    }

    /// Forget all tokens and state. Later calls fail until the caller
    /// authenticates again.
    pub fn reset(&mut self) {
        debug!("resetting token store");
        self.dispatch.reset_storage();
    }

    async fn fetch(&self, path: &str) -> Result<serde_json::Value> {
        let url = self.dispatch.resource_url(path);
        let body = self.dispatch.request_with_refresh(url).await?;
        self.dispatch.unpack_format(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    use sceneid_auth::{
        ACCESS_TOKEN_KEY, ClientConfig, Error, FileStore, REFRESH_TOKEN_KEY, TokenStore,
    };
    use transport::ScriptedTransport;

    fn scripted() -> (ResourceClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let config = ClientConfig::new(
            "myPortalClientID",
            "verySecretHashThing",
            "http://my.domain.tld/return.url",
        );
        let client = OAuthClient::with_transport(config, transport.clone()).unwrap();
        (ResourceClient::new(client), transport)
    }

    fn authenticate(api: &ResourceClient, access: &str, refresh: Option<&str>) {
        let store = api.client().storage();
        store.set(ACCESS_TOKEN_KEY, access.into()).unwrap();
        if let Some(refresh) = refresh {
            store.set(REFRESH_TOKEN_KEY, refresh.into()).unwrap();
        }
    }

    #[tokio::test]
    async fn fetch_user_by_id_hits_user_endpoint() {
        let (api, transport) = scripted();
        authenticate(&api, "T1", None);
        transport.push_ok(r#"{"success":true,"user":{"id":42,"display_name":"gargaj"}}"#);

        let user = api.fetch_user_by_id(42).await.unwrap();

        assert_eq!(user["user"]["id"], 42);
        assert_eq!(user["user"]["display_name"], "gargaj");
        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://id.scene.org/3/api/3.0/user/?id=42&format=json"
        );
        assert_eq!(request.header("Authorization"), Some("Bearer T1"));
    }

    #[tokio::test]
    async fn fetch_current_user_refreshes_expired_token() {
        let (api, transport) = scripted();
        authenticate(&api, "expiredT", Some("R1"));
        transport
            .push(401, r#"{"error":"invalid_token"}"#)
            .push_ok(r#"{"access_token":"T2"}"#)
            .push_ok(r#"{"success":true,"user":{"id":1}}"#);

        let me = api.fetch_current_user().await.unwrap();

        assert_eq!(me["user"]["id"], 1);
        assert_eq!(transport.grant_count("refresh_token"), 1);
        let requests = transport.requests();
        assert!(requests[0].url.contains("/me/?format=json"));
        assert_eq!(requests[2].header("Authorization"), Some("Bearer T2"));
    }

    #[tokio::test]
    async fn xml_format_is_not_unpacked() {
        let (mut api, transport) = scripted();
        api.client_mut().set_format("xml").unwrap();
        authenticate(&api, "T1", None);
        transport.push_ok("<user><id>1</id></user>");

        let err = api.fetch_current_user().await.unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn reset_forces_reauthentication() {
        let (mut api, transport) = scripted();
        authenticate(&api, "T1", Some("R1"));

        api.reset();

        let err = api.fetch_user_by_id(1).await.unwrap_err();
        assert!(matches!(err, Error::Authentication(ref m) if m == "not authenticated"));
        let err = api.client().refresh_token().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn reset_detaches_a_file_store_without_touching_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let (mut api, _transport) = scripted();
        let store = Arc::new(FileStore::open(&path).unwrap());
        api.client_mut().set_storage(store.clone());
        authenticate(&api, "T1", None);

        api.reset();

        assert_eq!(api.client().storage().get(ACCESS_TOKEN_KEY), None);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
    }

    /// Dispatcher that records URLs and replays one body.
    struct RecordingDispatch {
        body: String,
        urls: Mutex<Vec<String>>,
        resets: usize,
    }

    impl ResourceDispatch for RecordingDispatch {
        fn resource_url(&self, path: &str) -> String {
            format!("https://api.example.test{path}")
        }

        fn request_with_refresh<'a>(
            &'a self,
            url: String,
        ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
            self.urls.lock().unwrap().push(url);
            let body = self.body.clone();
            Box::pin(async move { Ok(body) })
        }

        fn unpack_format(&self, body: &str) -> Result<serde_json::Value> {
            serde_json::from_str(body).map_err(|e| Error::Protocol(e.to_string()))
        }

        fn reset_storage(&mut self) {
            self.resets += 1;
        }
    }

    #[tokio::test]
    async fn works_over_any_dispatcher() {
        let mut api = ResourceClient::new(RecordingDispatch {
            body: r#"{"id":5}"#.into(),
            urls: Mutex::new(Vec::new()),
            resets: 0,
        });

        let user = api.fetch_user_by_id(5).await.unwrap();
        api.fetch_current_user().await.unwrap();
        api.reset();

        assert_eq!(user["id"], 5);
        let dispatch = api.into_inner();
        assert_eq!(
            *dispatch.urls.lock().unwrap(),
            vec![
                "https://api.example.test/user/?id=5".to_owned(),
                "https://api.example.test/me/".to_owned(),
            ]
        );
        assert_eq!(dispatch.resets, 1);
    }
}
