//! OAuth token model and response parsing
//!
//! A `Token` is built only from a token endpoint response and never changes
//! afterwards. Refreshing yields a new `Token`; revoking leaves the
//! in-memory value untouched.
//!
//! Expiration handling follows the provider's payloads:
//! - `expires_in` is a delta in seconds, sent as a number or a numeric string
//! - `expires_in = 0` marks a token that does not expire
//! - `expiration` (absolute unix seconds) is accepted when `expires_in` is absent

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use common::Secret;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// When a token stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    Never,
    /// Unix timestamp in seconds (absolute).
    At(u64),
}

/// Credential returned by the token endpoint.
#[derive(Clone)]
pub struct Token {
    access_token: Secret<String>,
    refresh_token: Option<Secret<String>>,
    expires_in: Option<u64>,
    expiration: Expiration,
    raw: Value,
}

impl Token {
    /// Parse a token endpoint response body.
    ///
    /// Requires a non-empty `access_token` and one of `expires_in` or
    /// `expiration`. Any other fields are kept in [`Token::raw`].
    pub fn from_json(body: &str) -> Result<Self> {
        Self::from_json_at(body, unix_now())
    }

    /// Parse with an explicit "now" used to anchor a relative `expires_in`.
    pub(crate) fn from_json_at(body: &str, now: u64) -> Result<Self> {
        let raw: Value = serde_json::from_str(body)
            .map_err(|e| Error::TokenParse(format!("response is not valid JSON: {e}")))?;
        if !raw.is_object() {
            return Err(Error::TokenParse("response is not a JSON object".into()));
        }
        let response = TokenResponse::deserialize(&raw)
            .map_err(|e| Error::TokenParse(format!("unexpected token payload: {e}")))?;

        let access_token = response
            .access_token
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::TokenParse("missing access_token".into()))?;
        let refresh_token = response.refresh_token.filter(|r| !r.is_empty());

        let expiration = match (response.expires_in, response.expiration) {
            (Some(0), _) => Expiration::Never,
            (Some(delta), _) => Expiration::At(now.saturating_add(delta)),
            (None, Some(0)) => Expiration::Never,
            (None, Some(at)) => Expiration::At(at),
            (None, None) => {
                return Err(Error::TokenParse(
                    "missing expires_in or expiration".into(),
                ));
            }
        };

        Ok(Self {
            access_token: Secret::new(access_token),
            refresh_token: refresh_token.map(Secret::new),
            expires_in: response.expires_in,
            expiration,
            raw,
        })
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose()
    }

    /// Refresh value, if the grant returned one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|r| r.expose().as_str())
    }

    /// True when the token carries a non-blank refresh value.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_ref().is_some_and(|r| !r.is_blank())
    }

    /// The relative lifetime exactly as the server sent it.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    /// `token_type` from the payload, typically `"bearer"`.
    pub fn token_type(&self) -> Option<&str> {
        self.raw.get("token_type").and_then(Value::as_str)
    }

    /// Full response payload, including fields not modeled here.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn is_expired(&self) -> bool {
        self.expires_within_at(Duration::ZERO, unix_now())
    }

    /// True when the token expires within `window` from now (or already has).
    pub fn expires_within(&self, window: Duration) -> bool {
        self.expires_within_at(window, unix_now())
    }

    fn expires_within_at(&self, window: Duration, now: u64) -> bool {
        match self.expiration {
            Expiration::Never => false,
            Expiration::At(at) => at <= now.saturating_add(window.as_secs()),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw_fields: Vec<&str> = self
            .raw
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        f.debug_struct("Token")
            .field("access_token", &self.access_token)
            .field("refresh_token", &self.refresh_token)
            .field("expires_in", &self.expires_in)
            .field("expiration", &self.expiration)
            .field("raw_fields", &raw_fields)
            .finish()
    }
}

/// Wire shape of a token endpoint response. Unlisted fields stay in `raw`.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Seconds until expiry (delta, not absolute)
    #[serde(default, deserialize_with = "optional_seconds")]
    expires_in: Option<u64>,
    /// Unix timestamp in seconds (absolute)
    #[serde(default, deserialize_with = "optional_seconds")]
    expiration: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(u64),
    Text(String),
}

/// Accepts `3600`, `"3600"`, or `null`.
fn optional_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(n)) => Ok(Some(n)),
        Some(Seconds::Text(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            D::Error::custom("expected a non-negative integer number of seconds")
        }),
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
