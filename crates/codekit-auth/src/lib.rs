//! OAuth token client for the codekit API platform
//!
//! Issues, refreshes, and revokes bearer tokens against the provider's
//! authorization server. The crate holds no token cache and runs no
//! background work: each call is one request/response exchange and every
//! failure comes back as a typed [`Error`].
//!
//! Typical flow:
//! 1. Build [`Credentials`] and a [`TokenService`] over a [`Transport`]
//! 2. `client_credentials()` or `consent_url()` + `authorization_code()`
//! 3. Check `Token::expires_within()` and call `refresh()` when needed
//! 4. `revoke()` tokens the application no longer uses

pub mod constants;
pub mod error;
pub mod grant;
pub mod service;
pub mod telemetry;
pub mod token;
pub mod transport;

pub use common::Secret;
pub use constants::*;
pub use error::{Error, Result};
pub use grant::generate_state;
pub use service::{Credentials, GrantType, RevokeOptions, TokenService, TokenTypeHint};
pub use token::{Expiration, Token};
pub use transport::{FormRequest, ReqwestTransport, Transport, TransportError};
