//! Command-line interface and command execution

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codekit_auth::{RevokeOptions, Token, TokenService, TokenTypeHint};
use tracing::info;

/// Issue, refresh, and revoke OAuth tokens against the configured server
#[derive(Parser, Debug)]
#[command(name = "token-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "CONFIG_PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request a token for the configured scope
    ClientCredentials,

    /// Exchange an authorization code for a token
    AuthCode {
        /// Code delivered to the redirect URI
        code: String,
    },

    /// Exchange a refresh token for a new token
    Refresh {
        refresh_token: String,
    },

    /// Revoke an access or refresh token
    Revoke {
        token: String,

        /// Kind of token being revoked
        #[arg(long, value_enum, default_value = "access_token")]
        hint: Hint,
    },

    /// Print the consent page URL for the authorization code flow
    ConsentUrl {
        redirect_uri: String,
    },
}

/// `token_type_hint` values accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "snake_case")]
pub enum Hint {
    AccessToken,
    RefreshToken,
}

impl From<Hint> for TokenTypeHint {
    fn from(hint: Hint) -> Self {
        match hint {
            Hint::AccessToken => TokenTypeHint::AccessToken,
            Hint::RefreshToken => TokenTypeHint::RefreshToken,
        }
    }
}

/// Run `command` and return what should be printed on stdout.
pub async fn execute(
    service: &TokenService,
    revoke_options: &RevokeOptions,
    command: Command,
) -> Result<String> {
    match command {
        Command::ClientCredentials => {
            let token = service
                .client_credentials()
                .await
                .context("client credentials request failed")?;
            render(&token)
        }
        Command::AuthCode { code } => {
            let token = service
                .authorization_code(&code)
                .await
                .context("authorization code exchange failed")?;
            render(&token)
        }
        Command::Refresh { refresh_token } => {
            let token = service
                .refresh_with(&refresh_token)
                .await
                .context("token refresh failed")?;
            render(&token)
        }
        Command::Revoke { token, hint } => {
            let hint = TokenTypeHint::from(hint);
            service
                .revoke(&token, hint, revoke_options)
                .await
                .context("token revocation failed")?;
            info!(token_type_hint = hint.as_str(), "revocation accepted");
            Ok(String::from("revoked"))
        }
        Command::ConsentUrl { redirect_uri } => {
            let state = codekit_auth::generate_state();
            let url = service.consent_url(&redirect_uri, Some(state.as_str()))?;
            Ok(url)
        }
    }
}

fn render(token: &Token) -> Result<String> {
    serde_json::to_string_pretty(token.raw()).context("serializing token payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use codekit_auth::{Credentials, FormRequest, Transport, TransportError};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    type TransportResult = std::result::Result<String, TransportError>;

    /// Answers every request with the same body and keeps the last request.
    struct FixedTransport {
        response: TransportResult,
        last: Mutex<Option<FormRequest>>,
    }

    impl FixedTransport {
        fn last_request(&self) -> FormRequest {
            self.last.lock().unwrap().clone().unwrap()
        }
    }

    impl Transport for FixedTransport {
        fn post_form(
            &self,
            request: FormRequest,
        ) -> Pin<Box<dyn Future<Output = TransportResult> + Send + '_>> {
            *self.last.lock().unwrap() = Some(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn service(response: TransportResult) -> (TokenService, Arc<FixedTransport>) {
        let transport = Arc::new(FixedTransport {
            response,
            last: Mutex::new(None),
        });
        let credentials = Credentials::new("https://api.example.com", "app-key", "app-secret")
            .with_scope(["ADS"]);
        (TokenService::new(credentials, transport.clone()), transport)
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_commands() {
        let cli = Cli::try_parse_from(["token-cli", "client-credentials"]).unwrap();
        assert_eq!(cli.command, Command::ClientCredentials);

        let cli =
            Cli::try_parse_from(["token-cli", "--config", "/etc/t.toml", "auth-code", "abc"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/t.toml")));
        assert_eq!(cli.command, Command::AuthCode { code: "abc".into() });

        let cli =
            Cli::try_parse_from(["token-cli", "revoke", "rt_1", "--hint", "refresh_token"])
                .unwrap();
        assert_eq!(
            cli.command,
            Command::Revoke {
                token: "rt_1".into(),
                hint: Hint::RefreshToken
            }
        );
    }

    #[test]
    fn revoke_defaults_to_access_token_hint() {
        let cli = Cli::try_parse_from(["token-cli", "revoke", "at_1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Revoke {
                token: "at_1".into(),
                hint: Hint::AccessToken
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        for args in [
            vec!["token-cli"],
            vec!["token-cli", "refresh"],
            vec!["token-cli", "revoke", "t", "--hint", "id_token"],
            vec!["token-cli", "client-credentials", "--hint", "access_token"],
            vec!["token-cli", "--verbose", "client-credentials"],
        ] {
            assert!(Cli::try_parse_from(&args).is_err(), "{args:?} should fail");
        }
    }

    #[tokio::test]
    async fn client_credentials_prints_payload() {
        let (svc, transport) =
            service(Ok(r#"{"access_token":"at_1","expires_in":60,"scope":"ADS"}"#.into()));
        let out = execute(&svc, &RevokeOptions::default(), Command::ClientCredentials)
            .await
            .unwrap();

        let printed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(printed["access_token"], "at_1");
        assert_eq!(transport.last_request().param_value("scope"), Some("ADS"));
    }

    #[tokio::test]
    async fn refresh_sends_refresh_grant() {
        use metrics_exporter_prometheus::PrometheusBuilder;

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let (svc, transport) = service(Ok(r#"{"access_token":"at_2","expires_in":60}"#.into()));
        execute(
            &svc,
            &RevokeOptions::default(),
            Command::Refresh {
                refresh_token: "rt_1".into(),
            },
        )
        .await
        .unwrap();

        let request = transport.last_request();
        assert_eq!(request.param_value("grant_type"), Some("refresh_token"));
        assert_eq!(request.param_value("refresh_token"), Some("rt_1"));

        let output = handle.render();
        assert!(output.contains("operation=\"refresh\""), "got: {output}");
    }

    #[tokio::test]
    async fn blank_refresh_token_is_rejected_before_request() {
        let (svc, transport) = service(Ok(String::new()));
        let err = execute(
            &svc,
            &RevokeOptions::default(),
            Command::Refresh {
                refresh_token: " ".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(format!("{err:#}").contains("invalid argument"), "got: {err:#}");
        assert!(transport.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn revoke_uses_configured_path() {
        let (svc, transport) = service(Ok(String::new()));
        let options = RevokeOptions {
            revoke_path: Some("/custom/revoke".into()),
            ..Default::default()
        };
        let out = execute(
            &svc,
            &options,
            Command::Revoke {
                token: "at_1".into(),
                hint: Hint::AccessToken,
            },
        )
        .await
        .unwrap();

        assert_eq!(out, "revoked");
        let request = transport.last_request();
        assert_eq!(request.url, "https://api.example.com/custom/revoke");
        assert_eq!(request.param_value("token_type_hint"), Some("access_token"));
    }

    #[tokio::test]
    async fn failures_carry_context() {
        let (svc, _) = service(Err(TransportError::Status {
            status: 401,
            body: "invalid_client".into(),
        }));
        let err = execute(&svc, &RevokeOptions::default(), Command::ClientCredentials)
            .await
            .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("client credentials request failed"), "got: {chain}");
        assert!(chain.contains("invalid_client"), "got: {chain}");
    }

    #[tokio::test]
    async fn consent_url_includes_state() {
        let (svc, _) = service(Ok(String::new()));
        let url = execute(
            &svc,
            &RevokeOptions::default(),
            Command::ConsentUrl {
                redirect_uri: "https://app/cb".into(),
            },
        )
        .await
        .unwrap();
        assert!(url.starts_with("https://api.example.com/oauth/v4/authorize?"));
        assert!(url.contains("state="));
    }
}
