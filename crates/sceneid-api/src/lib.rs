//! SceneID resource API
//!
//! Named calls on top of the OAuth client: look up a user by id and fetch
//! the currently authenticated user. Each call goes through the
//! refresh-aware request path and unpacks the body per the configured
//! format.
//!
//! `ResourceClient` holds its dispatcher by composition; `OAuthClient` is the
//! production dispatcher.

pub mod dispatch;
pub mod resource;

pub use dispatch::ResourceDispatch;
pub use resource::ResourceClient;
pub use sceneid_auth::{Error, Result};
