//! SceneID demo client
//!
//! Drives the SceneID OAuth2 flows from the command line:
//! 1. `--user <id>` (default): client-credentials grant, then a user lookup
//! 2. `--auth-url`: prints the authorize URL (state kept in the token file)
//! 3. `--callback <query>`: finishes the authorization-code flow, prints `/me/`
//! 4. `--me`: fetches the current user with stored tokens

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use sceneid_api::ResourceClient;
use sceneid_auth::{Callback, FileStore, OAuthClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// What the binary was asked to do
#[derive(Debug, PartialEq, Eq)]
enum Command {
    User(u64),
    AuthUrl,
    Callback(String),
    Me,
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

/// Value of a flag that must carry one. A flag followed by nothing or by
/// another flag is an error.
fn required_value<'a>(args: &'a [String], name: &str) -> Result<Option<&'a str>> {
    if !has_flag(args, name) {
        return Ok(None);
    }
    match flag_value(args, name) {
        Some(value) if !value.starts_with("--") => Ok(Some(value)),
        _ => anyhow::bail!("{name} requires a value"),
    }
}

impl Command {
    fn from_args(args: &[String]) -> Result<Self> {
        if has_flag(args, "--auth-url") {
            return Ok(Self::AuthUrl);
        }
        if let Some(query) = required_value(args, "--callback")? {
            return Ok(Self::Callback(query.to_owned()));
        }
        if has_flag(args, "--me") {
            return Ok(Self::Me);
        }
        match required_value(args, "--user")? {
            Some(id) => {
                let id = id
                    .parse()
                    .with_context(|| format!("--user expects a numeric id, got {id}"))?;
                Ok(Self::User(id))
            }
            None => Ok(Self::User(1)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = Command::from_args(&args)?;

    let config_path = Config::resolve_path(required_value(&args, "--config")?);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let client_config = config.client_config()?;

    info!(
        client_id = %client_config.client_id,
        format = %client_config.format.as_str(),
        token_endpoint = %client_config.endpoints.token,
        "configuration loaded"
    );

    let mut client = OAuthClient::new(client_config).context("failed to create oauth client")?;
    match config.storage.token_file {
        Some(ref path) => {
            let store = FileStore::open(path)
                .with_context(|| format!("failed to open token file {}", path.display()))?;
            client.set_storage(Arc::new(store));
        }
        None if matches!(command, Command::AuthUrl | Command::Callback(_) | Command::Me) => {
            warn!("no storage.token_file configured; tokens and state are lost on exit");
        }
        None => {}
    }
    let api = ResourceClient::new(client);

    match command {
        Command::User(id) => {
            api.client()
                .acquire_client_credentials_token()
                .await
                .context("client-credentials grant failed")?;
            let user = api.fetch_user_by_id(id).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::AuthUrl => {
            let redirect = api.client().auth_redirect()?;
            info!(status = redirect.status(), "authorization redirect issued");
            println!("{}", redirect.location());
        }
        Command::Callback(query) => {
            let callback = Callback::from_query(&query);
            api.client()
                .process_auth_response(&callback)
                .await
                .context("authorization-code exchange failed")?;
            info!(phase = api.client().phase().label(), "callback processed");
            let me = api.fetch_current_user().await?;
            println!("{}", serde_json::to_string_pretty(&me)?);
        }
        Command::Me => {
            let me = api.fetch_current_user().await?;
            println!("{}", serde_json::to_string_pretty(&me)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("sceneid-demo")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_to_user_one() {
        assert_eq!(Command::from_args(&args(&[])).unwrap(), Command::User(1));
    }

    #[test]
    fn parses_user_id() {
        let parsed = Command::from_args(&args(&["--config", "x.toml", "--user", "42"])).unwrap();
        assert_eq!(parsed, Command::User(42));
    }

    #[test]
    fn rejects_non_numeric_user() {
        assert!(Command::from_args(&args(&["--user", "gargaj"])).is_err());
    }

    #[test]
    fn parses_flow_commands() {
        assert_eq!(
            Command::from_args(&args(&["--auth-url"])).unwrap(),
            Command::AuthUrl
        );
        assert_eq!(
            Command::from_args(&args(&["--callback", "?code=C1&state=S1"])).unwrap(),
            Command::Callback("?code=C1&state=S1".into())
        );
        assert_eq!(Command::from_args(&args(&["--me"])).unwrap(), Command::Me);
    }

    #[test]
    fn value_flags_without_a_value_are_rejected() {
        let err = Command::from_args(&args(&["--callback"])).unwrap_err();
        assert!(err.to_string().contains("--callback"), "got: {err}");
        assert!(Command::from_args(&args(&["--user"])).is_err());
        assert!(Command::from_args(&args(&["--callback", "--me"])).is_err());
        assert!(required_value(&args(&["--config"]), "--config").is_err());
        assert_eq!(
            required_value(&args(&["--me"]), "--config").unwrap(),
            None
        );
    }

    #[test]
    fn flag_value_reads_following_arg() {
        let a = args(&["--config", "/etc/sceneid.toml"]);
        assert_eq!(flag_value(&a, "--config"), Some("/etc/sceneid.toml"));
        assert_eq!(flag_value(&a, "--user"), None);
        assert_eq!(flag_value(&args(&["--config"]), "--config"), None);
    }
}
