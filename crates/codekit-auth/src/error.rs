//! Error types for token operations
//!
//! Each failure kind is its own variant so callers can tell a rejected
//! request apart from an unreadable response.

use crate::transport::TransportError;

/// Errors from token issue, refresh, and revoke.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token endpoint call failed (network error or non-2xx status).
    #[error("problem obtaining a token: {0}")]
    TokenRequest(#[source] TransportError),

    /// The token endpoint answered, but not with a usable token payload.
    #[error("error parsing the token response data: {0}")]
    TokenParse(String),

    /// The revoke endpoint call failed.
    #[error("problem revoking a token: {0}")]
    TokenRevocation(#[source] TransportError),

    /// The caller passed something unusable; no request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// HTTP status returned by the server, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::TokenRequest(e) | Error::TokenRevocation(e) => e.status(),
            _ => None,
        }
    }
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
