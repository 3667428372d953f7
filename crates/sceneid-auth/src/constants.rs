//! SceneID endpoint and protocol constants
//!
//! Endpoint URLs are defaults only; `Endpoints` in the client config can
//! point the client at another deployment.

/// Token endpoint for all three grants
pub const TOKEN_ENDPOINT: &str = "https://id.scene.org/oauth/token/";

/// Authorization endpoint the user's browser is redirected to
pub const AUTHORIZE_ENDPOINT: &str = "https://id.scene.org/oauth/authorize/";

/// Root of the v3 resource API
pub const RESOURCE_ENDPOINT: &str = "https://id.scene.org/3/api/3.0";

/// Store key holding the current access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Store key holding the current refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Store key holding the anti-forgery state of the pending redirect
pub const STATE_KEY: &str = "state";

/// Error code the resource API returns for expired or revoked access tokens
pub const INVALID_TOKEN: &str = "invalid_token";

/// Default transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
