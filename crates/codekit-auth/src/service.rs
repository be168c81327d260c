//! Token issue, refresh, and revoke against the authorization server
//!
//! Every operation is one form-encoded POST through the injected
//! [`Transport`]. The service keeps no state between calls beyond its
//! credentials, so a single instance can be shared across tasks. Nothing is
//! retried here; callers choose their own backoff.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use common::Secret;
use tracing::{debug, info, warn};

use crate::constants::{
    DEFAULT_AUTHORIZE_PATH, DEFAULT_REVOKE_PATH, DEFAULT_TOKEN_PATH, FORM_CONTENT_TYPE,
    JSON_ACCEPT, SCOPE_SEPARATOR,
};
use crate::error::{Error, Result};
use crate::telemetry::{self, Operation};
use crate::token::Token;
use crate::transport::{FormRequest, ReqwestTransport, Transport};

/// Form fields the service always fills from its own credentials.
const RESERVED_PARAMS: &[&str] = &["grant_type", "client_id", "client_secret"];

/// Application credentials and endpoint layout.
///
/// Immutable once handed to a [`TokenService`].
#[derive(Debug, Clone)]
pub struct Credentials {
    fqdn: String,
    client_id: String,
    client_secret: Secret<String>,
    scope: Vec<String>,
    token_path: String,
    authorize_path: String,
}

impl Credentials {
    /// `fqdn` is the server base address, e.g. `https://api.att.com`.
    /// A trailing slash is dropped.
    pub fn new(
        fqdn: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            fqdn: trim_base(fqdn.into()),
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            scope: Vec::new(),
            token_path: DEFAULT_TOKEN_PATH.to_owned(),
            authorize_path: DEFAULT_AUTHORIZE_PATH.to_owned(),
        }
    }

    /// Scopes requested by the client credentials and consent flows.
    /// Default: none.
    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    /// Token endpoint path. Default: [`DEFAULT_TOKEN_PATH`].
    pub fn with_token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Consent page path. Default: [`DEFAULT_AUTHORIZE_PATH`].
    pub fn with_authorize_path(mut self, path: impl Into<String>) -> Self {
        self.authorize_path = path.into();
        self
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    pub fn authorize_path(&self) -> &str {
        &self.authorize_path
    }

    /// Scopes joined for the wire (`ADS,SPEECH`), or `None` when unset.
    pub fn scope_param(&self) -> Option<String> {
        if self.scope.is_empty() {
            None
        } else {
            Some(self.scope.join(SCOPE_SEPARATOR))
        }
    }
}

/// OAuth grant type sent as `grant_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantType {
    ClientCredentials,
    AuthorizationCode,
    RefreshToken,
    /// Any grant the server accepts that is not modeled above.
    Other(String),
}

impl GrantType {
    pub fn as_str(&self) -> &str {
        match self {
            GrantType::ClientCredentials => "client_credentials",
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
            GrantType::Other(name) => name,
        }
    }
}

impl From<&str> for GrantType {
    fn from(name: &str) -> Self {
        match name {
            "client_credentials" => GrantType::ClientCredentials,
            "authorization_code" => GrantType::AuthorizationCode,
            "refresh_token" => GrantType::RefreshToken,
            other => GrantType::Other(other.to_owned()),
        }
    }
}

/// Which kind of token is being revoked (`token_type_hint`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenTypeHint::AccessToken => "access_token",
            TokenTypeHint::RefreshToken => "refresh_token",
        }
    }
}

impl FromStr for TokenTypeHint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "access_token" => Ok(TokenTypeHint::AccessToken),
            "refresh_token" => Ok(TokenTypeHint::RefreshToken),
            other => Err(Error::InvalidArgument(format!(
                "token type hint must be access_token or refresh_token, got {other:?}"
            ))),
        }
    }
}

/// Per-call overrides for [`TokenService::revoke`].
///
/// Every field falls back to the service's configuration when `None`.
#[derive(Debug, Clone, Default)]
pub struct RevokeOptions {
    /// Server base address. Default: the service's `fqdn`.
    pub fqdn: Option<String>,
    /// Client that owns the token. Default: the service's client id.
    pub client_id: Option<String>,
    /// Secret for `client_id`. Default: the service's client secret.
    pub client_secret: Option<Secret<String>>,
    /// Revoke endpoint path. Default: [`DEFAULT_REVOKE_PATH`].
    pub revoke_path: Option<String>,
}

/// Stateless client for the token and revoke endpoints.
#[derive(Clone)]
pub struct TokenService {
    credentials: Credentials,
    transport: Arc<dyn Transport>,
}

impl TokenService {
    pub fn new(credentials: Credentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    /// Service backed by [`ReqwestTransport`] over `client`.
    pub fn with_client(credentials: Credentials, client: reqwest::Client) -> Self {
        Self::new(credentials, Arc::new(ReqwestTransport::new(client)))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Request a new token with `grant` and grant-specific `extra` fields.
    ///
    /// Extra fields named `grant_type`, `client_id`, or `client_secret` are
    /// dropped and the service's own values are sent. This includes
    /// `grant_type`: to request a different grant, pass it as `grant`
    /// (e.g. `GrantType::Other`), not as an extra field.
    pub async fn issue(&self, grant: &GrantType, extra: &[(&str, &str)]) -> Result<Token> {
        self.request_token(Operation::Issue, grant, extra).await
    }

    /// Exchange the refresh value of `token` for a new token.
    ///
    /// Fails with [`Error::InvalidArgument`] without touching the network
    /// when `token` has no refresh value.
    pub async fn refresh(&self, token: &Token) -> Result<Token> {
        self.refresh_with(token.refresh_token().unwrap_or_default())
            .await
    }

    /// Exchange a bare refresh value for a new token.
    ///
    /// Same contract as [`TokenService::refresh`]; a blank value fails with
    /// [`Error::InvalidArgument`] before any request is sent.
    pub async fn refresh_with(&self, refresh_token: &str) -> Result<Token> {
        if refresh_token.trim().is_empty() {
            telemetry::record(Operation::Refresh, "invalid_argument");
            return Err(Error::InvalidArgument(
                "token has no refresh_token to refresh with".into(),
            ));
        }

        self.request_token(
            Operation::Refresh,
            &GrantType::RefreshToken,
            &[("refresh_token", refresh_token)],
        )
        .await
    }

    /// Ask the server to invalidate `token`. The response body is ignored.
    pub async fn revoke(
        &self,
        token: &str,
        hint: TokenTypeHint,
        options: &RevokeOptions,
    ) -> Result<()> {
        if token.is_empty() {
            telemetry::record(Operation::Revoke, "invalid_argument");
            return Err(Error::InvalidArgument("token to revoke is empty".into()));
        }

        let base = options
            .fqdn
            .as_deref()
            .map(|f| f.trim_end_matches('/'))
            .unwrap_or(self.credentials.fqdn.as_str());
        let path = options.revoke_path.as_deref().unwrap_or(DEFAULT_REVOKE_PATH);
        let client_id = options
            .client_id
            .as_deref()
            .unwrap_or(self.credentials.client_id.as_str());
        let client_secret = options
            .client_secret
            .as_ref()
            .unwrap_or(&self.credentials.client_secret);

        let request = FormRequest::new(format!("{base}{path}"))
            .header("Content-Type", FORM_CONTENT_TYPE)
            .param("client_id", client_id)
            .param("client_secret", client_secret.expose().as_str())
            .param("token", token)
            .param("token_type_hint", hint.as_str());

        debug!(url = %request.url, token_type_hint = hint.as_str(), "revoking token");

        match self.transport.post_form(request).await {
            Ok(_) => {
                info!(token_type_hint = hint.as_str(), "token revoked");
                telemetry::record(Operation::Revoke, "success");
                Ok(())
            }
            Err(e) => {
                warn!(status = ?e.status(), error = %e, "token revocation failed");
                telemetry::record(Operation::Revoke, "revocation_error");
                Err(Error::TokenRevocation(e))
            }
        }
    }

    async fn request_token(
        &self,
        operation: Operation,
        grant: &GrantType,
        extra: &[(&str, &str)],
    ) -> Result<Token> {
        let url = format!("{}{}", self.credentials.fqdn, self.credentials.token_path);
        let mut request = FormRequest::new(url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .header("Accept", JSON_ACCEPT)
            .param("grant_type", grant.as_str());

        for (key, value) in extra {
            if RESERVED_PARAMS.contains(key) {
                debug!(param = key, "ignoring reserved token parameter");
                continue;
            }
            request = request.param(*key, *value);
        }

        let request = request
            .param("client_id", self.credentials.client_id.as_str())
            .param(
                "client_secret",
                self.credentials.client_secret.expose().as_str(),
            );

        debug!(url = %request.url, grant_type = grant.as_str(), "requesting token");

        let body = match self.transport.post_form(request).await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    grant_type = grant.as_str(),
                    status = ?e.status(),
                    error = %e,
                    "token request failed"
                );
                telemetry::record(operation, "request_error");
                return Err(Error::TokenRequest(e));
            }
        };

        match Token::from_json(&body) {
            Ok(token) => {
                info!(
                    grant_type = grant.as_str(),
                    expires_in = ?token.expires_in(),
                    has_refresh = token.has_refresh_token(),
                    "token issued"
                );
                telemetry::record(operation, "success");
                Ok(token)
            }
            Err(e) => {
                warn!(grant_type = grant.as_str(), error = %e, "unusable token response");
                telemetry::record(operation, "parse_error");
                Err(e)
            }
        }
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

fn trim_base(mut fqdn: String) -> String {
    while fqdn.ends_with('/') {
        fqdn.pop();
    }
    fqdn
}
