//! Configuration types and loading
//!
//! Config path: `--config` / CONFIG_PATH > `token-cli.toml`.
//! The client secret comes from the OAUTH_CLIENT_SECRET env var or
//! `client_secret_file`, never from the TOML itself.

use codekit_auth::{Credentials, RevokeOptions};
use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file used when neither `--config` nor CONFIG_PATH is given.
pub const DEFAULT_CONFIG_PATH: &str = "token-cli.toml";

/// Env var holding the client secret.
pub const CLIENT_SECRET_ENV: &str = "OAUTH_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Authorization server and application identity
#[derive(Debug, Deserialize)]
pub struct OAuthConfig {
    pub fqdn: String,
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// File containing the client secret (alternative to the env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default)]
    pub token_path: Option<String>,
    #[serde(default)]
    pub authorize_path: Option<String>,
    #[serde(default)]
    pub revoke_path: Option<String>,
}

/// Outbound HTTP settings
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then resolve the client secret.
    ///
    /// Secret resolution order:
    /// 1. OAUTH_CLIENT_SECRET env var (ignored when blank)
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.oauth.fqdn.starts_with("http://") && !config.oauth.fqdn.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "fqdn must start with http:// or https://, got: {}",
                config.oauth.fqdn
            )));
        }

        if config.oauth.client_id.trim().is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }

        if config.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        let env_secret = std::env::var(CLIENT_SECRET_ENV)
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        if let Some(secret) = env_secret {
            config.oauth.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.oauth.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.oauth.client_secret = Some(Secret::new(secret));
            }
        }

        if config.oauth.client_secret.is_none() {
            return Err(common::Error::Config(format!(
                "client secret missing: set {CLIENT_SECRET_ENV} or client_secret_file"
            )));
        }

        Ok(config)
    }

    /// Config file path: `--config` / CONFIG_PATH (resolved by clap), else the default.
    pub fn resolve_path(cli_path: Option<&Path>) -> PathBuf {
        cli_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Library credentials built from the `[oauth]` section.
    pub fn credentials(&self) -> Credentials {
        let oauth = &self.oauth;
        let secret = oauth
            .client_secret
            .as_ref()
            .map(|s| s.expose().clone())
            .unwrap_or_default();
        let mut credentials = Credentials::new(oauth.fqdn.clone(), oauth.client_id.clone(), secret)
            .with_scope(oauth.scope.iter().cloned());
        if let Some(ref path) = oauth.token_path {
            credentials = credentials.with_token_path(path.clone());
        }
        if let Some(ref path) = oauth.authorize_path {
            credentials = credentials.with_authorize_path(path.clone());
        }
        credentials
    }

    /// Revoke overrides; only the path is configurable from the file.
    pub fn revoke_options(&self) -> RevokeOptions {
        RevokeOptions {
            revoke_path: self.oauth.revoke_path.clone(),
            ..Default::default()
        }
    }
}
