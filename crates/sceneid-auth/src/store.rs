//! Token storage abstraction
//!
//! The client persists its access token, refresh token, and pending
//! anti-forgery state through `TokenStore`. Implementations only need
//! last-write-wins semantics per key. `get` of an unset key is `None`,
//! never an error.
//!
//! `SessionStore` is the default: an in-memory map created explicitly for
//! one logical user session and dropped with it. `FileStore` persists the
//! same map as a JSON file.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::Result;

/// Key-value persistence for tokens and state.
///
/// Any type implementing this trait can be handed to
/// `OAuthClient::set_storage`; conformance is checked by the compiler.
pub trait TokenStore: Send + Sync {
    /// Read a value. Absent keys yield `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: String) -> Result<()>;
}

/// In-memory store scoped to a single user session.
#[derive(Default)]
pub struct SessionStore {
    values: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenStore for SessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_owned(), value);
        debug!(key, "session value stored");
        Ok(())
    }
}
