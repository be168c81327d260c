//! Token operation counters
//!
//! Emits through the `metrics` facade. Nothing is recorded unless the host
//! application installs a recorder.
//!
//! - `oauth_token_requests_total` (counter): labels `operation`, `outcome`

/// Which endpoint interaction a counter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Issue,
    Refresh,
    Revoke,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Issue => "issue",
            Operation::Refresh => "refresh",
            Operation::Revoke => "revoke",
        }
    }
}

/// Record the result of one token operation.
///
/// `outcome` is `"success"` or the failing error kind
/// (`"request_error"`, `"parse_error"`, `"revocation_error"`, `"invalid_argument"`).
pub fn record(operation: Operation, outcome: &'static str) {
    metrics::counter!(
        "oauth_token_requests_total",
        "operation" => operation.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
