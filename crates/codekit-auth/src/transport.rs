//! HTTP transport abstraction
//!
//! `TokenService` never talks to reqwest directly. It hands a `FormRequest`
//! to a `Transport`, which performs one form-encoded POST and returns the
//! response body. Tests substitute a recording double; production code uses
//! `ReqwestTransport`.
//!
//! Uses `Pin<Box<dyn Future>>` return types so the service can hold an
//! `Arc<dyn Transport>`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// Form keys whose values are credentials and must not be printed.
const SENSITIVE_KEYS: &[&str] = &["client_secret", "token", "refresh_token", "code"];

/// Failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No usable response: DNS, connect, TLS, timeout, or body read failure.
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(_) => None,
        }
    }

    /// Response body from the server, if one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            TransportError::Network(_) => None,
        }
    }
}

/// One form-encoded POST: target URL, extra headers, and ordered fields.
#[derive(Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub url: String,
    pub headers: Vec<(&'static str, &'static str)>,
    pub form: Vec<(String, String)>,
}

impl FormRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// First value sent under `key`.
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First header value sent under `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

impl fmt::Debug for FormRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form: Vec<(&str, &str)> = self
            .form
            .iter()
            .map(|(k, v)| {
                if SENSITIVE_KEYS.contains(&k.as_str()) {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("FormRequest")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("form", &form)
            .finish()
    }
}

/// Capability to send a single form-encoded POST.
///
/// Implementations must be safe to share across tasks. Timeouts and
/// cancellation are the implementation's concern; the service adds none.
pub trait Transport: Send + Sync {
    /// Send `request` and return the response body on a 2xx status.
    ///
    /// Non-2xx responses map to `TransportError::Status` carrying the body.
    fn post_form(
        &self,
        request: FormRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send + '_>>;
}

/// `Transport` backed by a shared `reqwest::Client`.
///
/// Configure timeouts on the client before handing it over.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn post_form(
        &self,
        request: FormRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send + '_>> {
        Box::pin(async move {
            debug!(url = %request.url, "sending form POST");

            let mut headers = HeaderMap::new();
            for (name, value) in &request.headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| TransportError::Network(format!("invalid header name: {e}")))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| TransportError::Network(format!("invalid header value: {e}")))?;
                headers.insert(name, value);
            }

            // `headers` replaces the Content-Type that `form` sets
            let response = self
                .client
                .post(&request.url)
                .form(&request.form)
                .headers(headers)
                .send()
                .await
                .map_err(|e| TransportError::Network(format!("request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<no body>"));
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .text()
                .await
                .map_err(|e| TransportError::Network(format!("reading response body: {e}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn debug_redacts_sensitive_fields() {
        let request = FormRequest::new("https://api.example.com/oauth/v4/token")
            .param("grant_type", "refresh_token")
            .param("client_id", "app-key")
            .param("client_secret", "s3cr3t")
            .param("refresh_token", "rt_live");
        let debug = format!("{request:?}");
        assert!(debug.contains("app-key"));
        assert!(debug.contains("refresh_token"));
        assert!(!debug.contains("s3cr3t"), "got: {debug}");
        assert!(!debug.contains("rt_live"), "got: {debug}");
    }

    #[test]
    fn param_and_header_lookup() {
        let request = FormRequest::new("http://localhost/x")
            .header("Accept", "application/json")
            .param("token", "abc123");
        assert_eq!(request.param_value("token"), Some("abc123"));
        assert_eq!(request.param_value("missing"), None);
        assert_eq!(request.header_value("accept"), Some("application/json"));
    }

    #[test]
    fn status_error_exposes_body() {
        let err = TransportError::Status {
            status: 400,
            body: "bad grant".into(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.body(), Some("bad grant"));
        assert_eq!(err.to_string(), "server returned 400: bad grant");
    }

    #[tokio::test]
    async fn reqwest_transport_posts_form_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v4/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("scope=ADS%2CSPEECH"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(reqwest::Client::new());
        let request = FormRequest::new(format!("{}/oauth/v4/token", server.uri()))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .param("grant_type", "client_credentials")
            .param("scope", "ADS,SPEECH");

        let body = transport.post_form(request).await.unwrap();
        assert_eq!(body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn reqwest_transport_maps_non_success_to_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v4/revoke"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::default();
        let request = FormRequest::new(format!("{}/oauth/v4/revoke", server.uri()))
            .param("token", "abc123");

        let err = transport.post_form(request).await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 401,
                body: "invalid_client".into()
            }
        );
    }

    #[tokio::test]
    async fn reqwest_transport_reports_connection_failure_as_network() {
        // Nothing listens on port 1
        let transport = ReqwestTransport::default();
        let err = transport
            .post_form(FormRequest::new("http://127.0.0.1:1/oauth/v4/token"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "got: {err:?}");
    }
}
