//! Token endpoint and resource reply parsing
//!
//! All three grants POST to the token endpoint with a Basic auth header and
//! receive the same reply shape: `access_token` (+ optional `refresh_token`)
//! on success, `error` / `error_description` on failure. Replies are parsed
//! into a tagged `TokenReply` so the client branches explicitly instead of
//! inspecting loose JSON.
//!
//! Resource replies follow one wire contract: a payload is a provider error
//! iff it is a JSON object with a string `error` field.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::Secret;
use serde::Deserialize;

use crate::error::{Error, Result};

/// OAuth2 grant types sent as `grant_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    ClientCredentials,
    AuthorizationCode,
    RefreshToken,
}

impl Grant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::AuthorizationCode => "authorization_code",
            Grant::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tokens issued by a successful grant.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
}

/// Outcome of a token endpoint call.
#[derive(Debug, Clone)]
pub enum TokenReply {
    Granted(TokenSet),
    Rejected {
        error: Option<String>,
        description: Option<String>,
    },
}

#[derive(Deserialize)]
struct RawTokenReply {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenReply {
    /// Parse a token endpoint body.
    ///
    /// Anything that is not a JSON object of the expected shape is an
    /// authentication failure. An object without a non-empty `access_token`
    /// is `Rejected`.
    pub fn parse(body: &str) -> Result<Self> {
        let raw: RawTokenReply = serde_json::from_str(body).map_err(|e| {
            Error::Authentication(format!("authorization failed: malformed token response ({e})"))
        })?;

        match raw.access_token.filter(|t| !t.is_empty()) {
            Some(access) => Ok(TokenReply::Granted(TokenSet {
                access_token: Secret::new(access),
                refresh_token: raw.refresh_token.filter(|t| !t.is_empty()).map(Secret::new),
            })),
            None => Ok(TokenReply::Rejected {
                error: raw.error,
                description: raw.error_description,
            }),
        }
    }

    /// Convert into the issued tokens, or an `Authentication` error carrying
    /// the provider's description.
    pub fn into_tokens(self) -> Result<TokenSet> {
        match self {
            TokenReply::Granted(tokens) => Ok(tokens),
            TokenReply::Rejected { error, description } => {
                Err(Error::Authentication(rejection_message(error, description)))
            }
        }
    }
}

fn rejection_message(error: Option<String>, description: Option<String>) -> String {
    match (description, error) {
        (Some(description), _) => format!("authorization failed: {description}"),
        (None, Some(error)) => format!("authorization failed: {error}"),
        (None, None) => "authorization failed".to_owned(),
    }
}

/// Classification of a resource endpoint body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceReply {
    Payload,
    ProviderError {
        code: String,
        description: Option<String>,
    },
}

impl ResourceReply {
    /// Apply the wire contract. Non-JSON bodies (e.g. XML) are payloads.
    pub fn classify(body: &str) -> Self {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body)
        else {
            return ResourceReply::Payload;
        };
        match map.get("error").and_then(|v| v.as_str()) {
            Some(code) => ResourceReply::ProviderError {
                code: code.to_owned(),
                description: map
                    .get("error_description")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            },
            None => ResourceReply::Payload,
        }
    }

    pub fn is_error_code(&self, expected: &str) -> bool {
        matches!(self, ResourceReply::ProviderError { code, .. } if code == expected)
    }
}

/// `Authorization` header value for client authentication at the token
/// endpoint: `Basic base64(client_id:client_secret)`.
pub fn basic_auth_header(client_id: &str, client_secret: &Secret<String>) -> String {
    let credentials = format!("{client_id}:{}", client_secret.expose());
    format!("Basic {}", STANDARD.encode(credentials))
}
