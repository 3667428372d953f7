//! Client configuration
//!
//! `ClientConfig` carries the registered client identity plus the mutable
//! request preferences (scope, response format). Presence checks happen in
//! `OAuthClient::new`, so a config can be assembled field by field.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use common::Secret;

use crate::constants::{AUTHORIZE_ENDPOINT, DEFAULT_TIMEOUT_SECS, RESOURCE_ENDPOINT, TOKEN_ENDPOINT};
use crate::error::{Error, Result};

/// Response format requested from the resource API via the `format` parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Case-insensitive: `"XML"` parses as `Format::Xml`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            other => Err(Error::Configuration(format!(
                "format must be either json or xml, got: {other}"
            ))),
        }
    }
}

/// Requested OAuth scopes.
///
/// Built from a whitespace-separated string or an explicit list; empty
/// entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope(Vec<String>);

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }

    /// Space-joined form sent on the wire.
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Scope(s.split_whitespace().map(String::from).collect())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Scope::from(s.as_str())
    }
}

impl From<Vec<String>> for Scope {
    fn from(items: Vec<String>) -> Self {
        Scope(
            items
                .into_iter()
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

impl From<Vec<&str>> for Scope {
    fn from(items: Vec<&str>) -> Self {
        Scope::from(items.into_iter().map(String::from).collect::<Vec<_>>())
    }
}

/// Provider endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token: String,
    pub authorize: String,
    pub resource: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token: TOKEN_ENDPOINT.to_owned(),
            authorize: AUTHORIZE_ENDPOINT.to_owned(),
            resource: RESOURCE_ENDPOINT.to_owned(),
        }
    }
}

impl Endpoints {
    /// Resource URL for a domain path such as `/me/`.
    pub fn resource_url(&self, path: &str) -> String {
        format!("{}{}", self.resource.trim_end_matches('/'), path)
    }
}

/// Registered client identity and request preferences.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub scope: Scope,
    pub format: Format,
    pub endpoints: Endpoints,
    /// Per-request transport timeout
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<Secret<String>>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scope: Scope::default(),
            format: Format::default(),
            endpoints: Endpoints::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that the mandatory identity fields are present.
    ///
    /// Whitespace-only values count as missing.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Configuration(
                "client_id invalid or missing".into(),
            ));
        }
        if self.client_secret.is_blank() {
            return Err(Error::Configuration(
                "client_secret invalid or missing".into(),
            ));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(Error::Configuration(
                "redirect_uri invalid or missing".into(),
            ));
        }
        Ok(())
    }
}
