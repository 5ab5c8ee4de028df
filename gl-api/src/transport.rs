//! HTTP transport seam.
//!
//! Requests and responses are described as plain data. The [`Transport`]
//! trait executes one request and returns one response; it never retries and
//! never interprets the status. [`ReqwestTransport`] is the production
//! implementation, and tests substitute scripted doubles.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use gl_core::config::ClientConfig;
use gl_core::constants;
use gl_core::error::{GlError, GlResult};

use crate::multipart::FilePart;

/// HTTP verb of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    /// Whether call parameters travel in the query string rather than the body.
    pub fn params_in_query(&self) -> bool {
        matches!(self, Verb::Get | Verb::Delete)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verb> for reqwest::Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    /// Serialized JSON document.
    Json(Vec<u8>),
    /// File encoded by the HTTP library's multipart support.
    Form(FilePart),
    /// Pre-encoded bytes; the content type is carried in the headers.
    Raw(Vec<u8>),
}

/// A fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub verb: Verb,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl Request {
    /// Look up a header value, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A received HTTP response with its body fully buffered.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Canonical reason phrase, empty for unknown codes.
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response with the canonical reason phrase for `status`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Attach a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as lossy UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes a single HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` once. HTTP error statuses are returned as responses;
    /// only failures to complete the exchange are errors.
    async fn send(&self, request: &Request) -> GlResult<Response>;
}

/// Transport backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport honoring the configured request timeout.
    pub fn new(config: &ClientConfig) -> GlResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(constants::CONNECT_TIMEOUT_SECS))
            .user_agent(constants::USER_AGENT)
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| GlError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { inner })
    }

    /// Classify a reqwest error into a GlError variant.
    fn classify_error(e: reqwest::Error) -> GlError {
        if e.is_timeout() {
            GlError::Timeout(e.to_string())
        } else if e.is_connect() {
            GlError::Transport(format!("connection failed: {e}"))
        } else {
            GlError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> GlResult<Response> {
        let mut builder = self.inner.request(request.verb.into(), &request.url);
        for (key, value) in &request.headers {
            // hyper derives Content-Length from the body itself.
            if key.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) | RequestBody::Raw(bytes) => builder.body(bytes.clone()),
            RequestBody::Form(part) => builder.multipart(part.to_form()?),
        };

        let response = builder.send().await.map_err(Self::classify_error)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(Self::classify_error)?
            .to_vec();

        Ok(Response {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_serde_uppercase() {
        let verb: Verb = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(verb, Verb::Delete);
        assert_eq!(serde_json::to_string(&Verb::Get).unwrap(), "\"GET\"");
        assert!(Verb::Get.params_in_query());
        assert!(!Verb::Put.params_in_query());
    }

    #[test]
    fn test_response_reason_and_headers() {
        let resp = Response::new(429, "slow down").with_header("Retry-After", "1");
        assert_eq!(resp.reason, "Too Many Requests");
        assert_eq!(resp.header("retry-after"), Some("1"));
        assert!(!resp.is_success());
        assert_eq!(resp.text(), "slow down");
    }

    #[test]
    fn test_response_json() {
        let resp = Response::new(200, r#"{"id": 1}"#);
        assert!(resp.is_success());
        assert_eq!(resp.json().unwrap()["id"], 1);
        assert!(Response::new(200, "<html>").json().is_err());
    }

    #[test]
    fn test_unknown_status_has_empty_reason() {
        assert_eq!(Response::new(599, "").reason, "");
    }

    #[test]
    fn test_reqwest_transport_builds() {
        let config = ClientConfig::new("https://gitlab.example.com");
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to obtain a port with nothing listening.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let transport = ReqwestTransport::new(&ClientConfig::new("http://127.0.0.1")).unwrap();
        let request = Request {
            verb: Verb::Get,
            url: format!("http://127.0.0.1:{port}/api/v4/version"),
            headers: Vec::new(),
            body: RequestBody::Empty,
        };
        let err = transport.send(&request).await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }
}
