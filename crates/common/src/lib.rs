//! Shared types for the SceneID client workspace

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
