//! Grant-specific entry points
//!
//! Thin wrappers over [`TokenService::issue`] for the two flows the SDK
//! exposes:
//! 1. Client credentials: server-to-server token with the configured scope
//! 2. Authorization code: send the user to `consent_url()`, then exchange
//!    the code delivered to the redirect URI with `authorization_code()`

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use reqwest::Url;

use crate::error::{Error, Result};
use crate::service::{GrantType, TokenService};
use crate::token::Token;

impl TokenService {
    /// Request a client credentials token for the configured scope.
    ///
    /// `scope` is omitted from the form when no scope is configured.
    pub async fn client_credentials(&self) -> Result<Token> {
        match self.credentials().scope_param() {
            Some(scope) => {
                self.issue(&GrantType::ClientCredentials, &[("scope", scope.as_str())])
                    .await
            }
            None => self.issue(&GrantType::ClientCredentials, &[]).await,
        }
    }

    /// Exchange an authorization code for a token.
    pub async fn authorization_code(&self, code: &str) -> Result<Token> {
        if code.is_empty() {
            return Err(Error::InvalidArgument("authorization code is empty".into()));
        }
        self.issue(&GrantType::AuthorizationCode, &[("code", code)])
            .await
    }

    /// URL of the consent page that starts the authorization code flow.
    ///
    /// `state` is echoed back to `redirect_uri` unchanged; pass the value
    /// from [`generate_state`] and compare it in the callback.
    pub fn consent_url(&self, redirect_uri: &str, state: Option<&str>) -> Result<String> {
        let credentials = self.credentials();
        let base = format!("{}{}", credentials.fqdn(), credentials.authorize_path());

        let mut params: Vec<(&str, String)> =
            vec![("client_id", credentials.client_id().to_owned())];
        if let Some(scope) = credentials.scope_param() {
            params.push(("scope", scope));
        }
        params.push(("redirect_uri", redirect_uri.to_owned()));
        if let Some(state) = state {
            params.push(("state", state.to_owned()));
        }

        let url = Url::parse_with_params(&base, &params)
            .map_err(|e| Error::InvalidArgument(format!("invalid consent URL {base}: {e}")))?;
        Ok(url.into())
    }
}

/// Random opaque value for the consent flow's `state` parameter.
///
/// 32 random bytes encoded as URL-safe base64 without padding (43 chars).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
