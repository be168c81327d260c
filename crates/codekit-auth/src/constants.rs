//! Default authorization server paths
//!
//! Each path is appended to the configured `fqdn`. Override only when the
//! server is deployed under a non-standard prefix.

/// Token endpoint used for every grant type, including refresh.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/v4/token";

/// Revocation endpoint for access and refresh tokens.
pub const DEFAULT_REVOKE_PATH: &str = "/oauth/v4/revoke";

/// Consent page the user is redirected to for the authorization code flow.
pub const DEFAULT_AUTHORIZE_PATH: &str = "/oauth/v4/authorize";

/// Separator used when sending more than one scope.
pub const SCOPE_SEPARATOR: &str = ",";

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub(crate) const JSON_ACCEPT: &str = "application/json";
