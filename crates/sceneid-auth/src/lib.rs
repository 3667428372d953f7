//! SceneID OAuth2 client library
//!
//! Authenticates against SceneID with the client-credentials and
//! authorization-code grants, keeps tokens in a pluggable `TokenStore`, and
//! sends Bearer-authenticated resource requests that refresh the access
//! token once when the provider reports it invalid.
//!
//! Authorization-code flow:
//! 1. `OAuthClient::auth_redirect()` stores a fresh `state` and yields the
//!    302 to the provider's authorize page
//! 2. The provider redirects back with `code` and `state`
//! 3. `OAuthClient::process_auth_response()` checks the state and exchanges
//!    the code; tokens land in the store
//! 4. `OAuthClient::authenticated_request_with_refresh()` uses the access
//!    token, calling `refresh_token()` once on `invalid_token`

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod file_store;
pub mod metrics;
pub mod state;
pub mod store;
pub mod token;

pub use client::OAuthClient;
pub use config::{ClientConfig, Endpoints, Format, Scope};
pub use constants::*;
pub use error::{Error, Result};
pub use file_store::FileStore;
pub use state::{AuthPhase, AuthRedirect, Callback, build_authorization_url, generate_state};
pub use store::{SessionStore, TokenStore};
pub use token::{Grant, ResourceReply, TokenReply, TokenSet};
pub use transport::Method;
