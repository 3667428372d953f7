//! Demo configuration
//!
//! Config path precedence: `--config` > `CONFIG_PATH` env var >
//! `sceneid.toml`. The client secret comes from `SCENEID_CLIENT_SECRET` or
//! `client_secret_file`, never from the TOML itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::Secret;
use sceneid_auth::{ClientConfig, Endpoints, Format};
use serde::Deserialize;

/// Env var holding the client secret
pub const SECRET_ENV: &str = "SCENEID_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub client: ClientSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub endpoints: EndpointOverrides,
}

/// Registered application identity
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Alternative to the SCENEID_CLIENT_SECRET env var
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    /// Whitespace-separated scopes
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where tokens live between runs
#[derive(Debug, Default, Deserialize)]
pub struct StorageSection {
    /// JSON token file; tokens are kept in memory when unset
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// Optional endpoint overrides (staging deployments)
#[derive(Debug, Default, Deserialize)]
pub struct EndpointOverrides {
    pub token: Option<String>,
    pub authorize: Option<String>,
    pub resource: Option<String>,
}

fn default_format() -> String {
    "json".into()
}

fn default_timeout() -> u64 {
    30
}

fn require_http(field: &str, url: &str) -> common::Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(common::Error::Config(format!(
            "{field} must start with http:// or https://, got: {url}"
        )))
    }
}

impl Config {
    /// Load configuration from a TOML file and resolve the client secret.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        require_http("redirect_uri", &config.client.redirect_uri)?;
        for (field, url) in [
            ("endpoints.token", &config.endpoints.token),
            ("endpoints.authorize", &config.endpoints.authorize),
            ("endpoints.resource", &config.endpoints.resource),
        ] {
            if let Some(url) = url {
                require_http(field, url)?;
            }
        }

        if config.client.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        config
            .client
            .format
            .parse::<Format>()
            .map_err(|e| common::Error::Config(e.to_string()))?;

        // Env var takes precedence over the secret file
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            config.client.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.client.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.client.client_secret = Some(Secret::new(secret));
            }
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("sceneid.toml")
    }

    /// Build the OAuth client configuration.
    pub fn client_config(&self) -> common::Result<ClientConfig> {
        let secret = self.client.client_secret.clone().ok_or_else(|| {
            common::Error::Config(format!(
                "client secret missing: set {SECRET_ENV} or client_secret_file"
            ))
        })?;
        let format = self
            .client
            .format
            .parse::<Format>()
            .map_err(|e| common::Error::Config(e.to_string()))?;

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            token: self.endpoints.token.clone().unwrap_or(defaults.token),
            authorize: self.endpoints.authorize.clone().unwrap_or(defaults.authorize),
            resource: self.endpoints.resource.clone().unwrap_or(defaults.resource),
        };

        let mut client = ClientConfig::new(
            self.client.client_id.clone(),
            secret,
            self.client.redirect_uri.clone(),
        )
        .with_format(format)
        .with_endpoints(endpoints)
        .with_timeout(Duration::from_secs(self.client.timeout_secs));
        if let Some(ref scope) = self.client.scope {
            client = client.with_scope(scope.as_str());
        }
        Ok(client)
    }
}
