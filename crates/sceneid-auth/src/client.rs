//! SceneID OAuth2 client
//!
//! Orchestrates the client-credentials and authorization-code grants, token
//! refresh, and authenticated resource requests. Tokens and the pending
//! anti-forgery state live in a `TokenStore`; the client itself keeps no
//! token state between calls.
//!
//! Every request carries the `format` query parameter. GET parameters go in
//! the query string, POST parameters in a form-urlencoded body.

use std::sync::Arc;

use tracing::{debug, info, warn};
use transport::{HttpRequest, Method, ReqwestTransport, Transport, TransportError};

use crate::config::{ClientConfig, Format, Scope};
use crate::constants::{ACCESS_TOKEN_KEY, INVALID_TOKEN, REFRESH_TOKEN_KEY, STATE_KEY};
use crate::error::{Error, Result};
use crate::metrics;
use crate::state::{AuthPhase, AuthRedirect, Callback, build_authorization_url, generate_state};
use crate::store::{SessionStore, TokenStore};
use crate::token::{Grant, ResourceReply, TokenReply, TokenSet, basic_auth_header};

/// OAuth2 client bound to one registered application and one token store.
pub struct OAuthClient {
    config: ClientConfig,
    storage: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
}

impl OAuthClient {
    /// Create a client using the `reqwest` transport.
    ///
    /// Fails with `Configuration` when client id, secret, or redirect URI is
    /// missing, and with `Environment` when the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout)
            .map_err(|e| Error::Environment(format!("HTTP transport unavailable: {e}")))?;
        Ok(Self::assemble(config, Arc::new(transport)))
    }

    /// Create a client over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        info!(
            client_id = %config.client_id,
            transport = transport.id(),
            format = %config.format,
            "oauth client initialized"
        );
        Self {
            config,
            storage: Arc::new(SessionStore::new()),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the requested scopes. Strings are split on whitespace.
    pub fn set_scope(&mut self, scope: impl Into<Scope>) {
        self.config.scope = scope.into();
    }

    /// Set the resource format from its name, case-insensitively.
    pub fn set_format(&mut self, format: &str) -> Result<()> {
        self.config.format = format.parse()?;
        Ok(())
    }

    pub fn format(&self) -> Format {
        self.config.format
    }

    /// Swap the token store. Values held by the previous store are not copied.
    pub fn set_storage(&mut self, storage: Arc<dyn TokenStore>) {
        debug!("token store replaced");
        self.storage = storage;
    }

    pub fn storage(&self) -> &Arc<dyn TokenStore> {
        &self.storage
    }

    /// Current flow position, derived from what the store holds.
    ///
    /// Never `CallbackPending`: a callback either stores tokens or leaves
    /// the issued state in place.
    pub fn phase(&self) -> AuthPhase {
        if self.stored(ACCESS_TOKEN_KEY).is_some() {
            AuthPhase::Authenticated
        } else if self.stored(STATE_KEY).is_some() {
            AuthPhase::RedirectIssued
        } else {
            AuthPhase::Unauthenticated
        }
    }

    /// Absolute resource URL for a domain path such as `/me/`.
    pub fn resource_url(&self, path: &str) -> String {
        self.config.endpoints.resource_url(path)
    }

    /// Obtain an application token with the client-credentials grant.
    ///
    /// Needs no user interaction and no prior state.
    pub async fn acquire_client_credentials_token(&self) -> Result<()> {
        let scope = self.config.scope.joined();
        let mut params = Vec::new();
        if !self.config.scope.is_empty() {
            params.push(("scope", scope.as_str()));
        }
        self.exchange_grant(Grant::ClientCredentials, &params).await
    }

    /// Start the authorization-code flow.
    ///
    /// Generates and stores a fresh anti-forgery state, then returns the
    /// provider's authorize URL.
    pub fn auth_url(&self) -> Result<String> {
        let state = generate_state();
        self.storage.set(STATE_KEY, state.clone())?;
        let url = build_authorization_url(
            &self.config.endpoints.authorize,
            &self.config.client_id,
            &self.config.redirect_uri,
            &state,
            &self.config.scope,
        )?;
        debug!(phase = AuthPhase::RedirectIssued.label(), "authorization url issued");
        Ok(url)
    }

    /// `auth_url` packaged as a 302 redirect for the hosting web layer.
    pub fn auth_redirect(&self) -> Result<AuthRedirect> {
        Ok(AuthRedirect::new(self.auth_url()?))
    }

    /// Finish the authorization-code flow from the provider's callback.
    ///
    /// The code must be present, and when a state was issued the callback
    /// must echo it exactly. Both checks run before any network call.
    pub async fn process_auth_response(&self, callback: &Callback) -> Result<()> {
        debug!(phase = AuthPhase::CallbackPending.label(), "processing authorization callback");

        let code = callback
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Protocol("missing authorization code".into()))?;

        if let Some(expected) = self.stored(STATE_KEY)
            && callback.state.as_deref() != Some(expected.as_str())
        {
            warn!("callback state does not match the issued state");
            return Err(Error::Protocol("state mismatch".into()));
        }

        self.exchange_grant(
            Grant::AuthorizationCode,
            &[
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ],
        )
        .await
    }

    /// Trade the stored refresh token for new tokens.
    pub async fn refresh_token(&self) -> Result<()> {
        let refresh = self
            .stored(REFRESH_TOKEN_KEY)
            .ok_or_else(|| Error::Authentication("not authenticated".into()))?;
        self.exchange_grant(Grant::RefreshToken, &[("refresh_token", refresh.as_str())])
            .await
    }

    /// Send a Bearer-authenticated request and return the raw body.
    ///
    /// `url = None` targets the resource endpoint root. The body is not
    /// inspected.
    pub async fn authenticated_request(
        &self,
        url: Option<&str>,
        method: Method,
        params: &[(&str, &str)],
    ) -> Result<String> {
        let url = url.unwrap_or(&self.config.endpoints.resource);
        let access = self
            .stored(ACCESS_TOKEN_KEY)
            .ok_or_else(|| Error::Authentication("not authenticated".into()))?;
        self.send(url, method, params, format!("Bearer {access}"))
            .await
    }

    /// `authenticated_request`, refreshing once on `invalid_token`.
    ///
    /// On an `invalid_token` reply, performs exactly one refresh and one
    /// retry, and returns the retry's body whatever it contains.
    pub async fn authenticated_request_with_refresh(
        &self,
        url: Option<&str>,
        method: Method,
        params: &[(&str, &str)],
    ) -> Result<String> {
        let body = self.authenticated_request(url, method, params).await?;
        if !ResourceReply::classify(&body).is_error_code(INVALID_TOKEN) {
            return Ok(body);
        }

        info!("access token rejected as invalid, refreshing");
        metrics::record_refresh_retry();
        self.refresh_token().await?;
        self.authenticated_request(url, method, params).await
    }

    /// Decode a resource body according to the configured format.
    pub fn unpack_format(&self, body: &str) -> Result<serde_json::Value> {
        match self.config.format {
            Format::Json => serde_json::from_str(body)
                .map_err(|e| Error::Protocol(format!("malformed JSON payload: {e}"))),
            Format::Xml => Err(Error::NotImplemented("XML response unpacking".into())),
        }
    }

    /// Empty strings count as absent.
    fn stored(&self, key: &str) -> Option<String> {
        self.storage.get(key).filter(|v| !v.is_empty())
    }

    async fn exchange_grant(&self, grant: Grant, params: &[(&str, &str)]) -> Result<()> {
        let authorization = basic_auth_header(&self.config.client_id, &self.config.client_secret);
        let mut form = vec![("grant_type", grant.as_str())];
        form.extend_from_slice(params);

        let body = self
            .send(&self.config.endpoints.token, Method::Post, &form, authorization)
            .await?;

        let reply = TokenReply::parse(&body);
        metrics::record_grant(grant, matches!(reply, Ok(TokenReply::Granted(_))));
        let tokens = reply.and_then(TokenReply::into_tokens).inspect_err(|e| {
            warn!(grant = %grant, error = %e, "token grant failed");
        })?;

        self.store_tokens(tokens)?;
        info!(grant = %grant, "token grant succeeded");
        Ok(())
    }

    /// A reply without a refresh token keeps the stored one.
    fn store_tokens(&self, tokens: TokenSet) -> Result<()> {
        self.storage
            .set(ACCESS_TOKEN_KEY, tokens.access_token.expose().clone())?;
        if let Some(refresh) = tokens.refresh_token {
            self.storage
                .set(REFRESH_TOKEN_KEY, refresh.expose().clone())?;
        }
        Ok(())
    }

    async fn send(
        &self,
        url: &str,
        method: Method,
        params: &[(&str, &str)],
        authorization: String,
    ) -> Result<String> {
        let format = self.config.format.as_str();
        let (query, body) = match method {
            Method::Get => {
                let mut query = params.to_vec();
                query.push(("format", format));
                (encode(&query)?, None)
            }
            Method::Post => {
                let body = if params.is_empty() {
                    None
                } else {
                    Some(encode(params)?)
                };
                (encode(&[("format", format)])?, body)
            }
        };
        let separator = if url.contains('?') { '&' } else { '?' };

        let request = HttpRequest {
            method,
            url: format!("{url}{separator}{query}"),
            headers: vec![("Authorization".to_owned(), authorization)],
            body,
        };

        let response = self.transport.execute(request).await?;

        // Error bodies in JSON go on to the reply parsers so provider
        // descriptions survive
        if !response.is_success()
            && serde_json::from_str::<serde_json::Value>(&response.body).is_err()
        {
            warn!(status = response.status, url, "non-JSON error response");
            return Err(Error::Transport(TransportError::Request(format!(
                "{url} returned {}: {}",
                response.status, response.body
            ))));
        }

        Ok(response.body)
    }
}

fn encode(pairs: &[(&str, &str)]) -> Result<String> {
    serde_urlencoded::to_string(pairs)
        .map_err(|e| Error::Protocol(format!("encoding request parameters: {e}")))
}
