//! Error types
//!
//! Only [`TransportError`] is subject to the client's catch-errors policy.
//! Every other [`HttpError`] variant signals a programming or data error and
//! always reaches the caller.

use crate::response::HttpResponse;
use thiserror::Error;

/// Errors surfaced by the client
#[derive(Error, Debug)]
pub enum HttpError {
    /// Unsupported constructor input, method token or call argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or protocol failure during dispatch
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response body is not valid JSON
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// Dynamic call name matched no routing rule
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Dynamic call made without a required argument
    #[error("Missing argument: {0}")]
    MissingArgument(String),
}

/// Result type for client operations
pub type HttpResult<T> = Result<T, HttpError>;

/// Failures raised by a [`Transport`](crate::transport::Transport)
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed (DNS, TCP, TLS)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Options could not be turned into a request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// URI could not be resolved against the base URI
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Too many redirects
    #[error("Redirect error: {0}")]
    Redirect(String),

    /// Error status with `http_errors` enabled
    #[error("HTTP status {status}: {reason}")]
    Status {
        status: u16,
        reason: String,
        response: Box<HttpResponse>,
    },

    /// Writing the body to its sink failed
    #[error("Sink error: {0}")]
    Sink(String),

    /// Generic reqwest error
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCategory {
    /// Connection-related errors (DNS, TCP, TLS)
    Connection,
    /// Timeout errors
    Timeout,
    /// Invalid request construction
    Request,
    /// Error status or unreadable response
    Response,
    /// Redirect errors
    Redirect,
    /// Unknown/other errors
    Unknown,
}

impl TransportError {
    /// Categorize the error for reporting
    pub fn category(&self) -> TransportErrorCategory {
        match self {
            TransportError::Connection(_) => TransportErrorCategory::Connection,
            TransportError::Timeout(_) => TransportErrorCategory::Timeout,
            TransportError::InvalidRequest(_)
            | TransportError::InvalidUrl(_)
            | TransportError::UrlParse(_) => TransportErrorCategory::Request,
            TransportError::Status { .. } | TransportError::Sink(_) => {
                TransportErrorCategory::Response
            }
            TransportError::Redirect(_) => TransportErrorCategory::Redirect,
            TransportError::Reqwest(e) => {
                if e.is_connect() {
                    TransportErrorCategory::Connection
                } else if e.is_timeout() {
                    TransportErrorCategory::Timeout
                } else if e.is_redirect() {
                    TransportErrorCategory::Redirect
                } else if e.is_request() || e.is_builder() {
                    TransportErrorCategory::Request
                } else if e.is_status() || e.is_body() || e.is_decode() {
                    TransportErrorCategory::Response
                } else {
                    TransportErrorCategory::Unknown
                }
            }
        }
    }

    /// Response attached to an error status, if any
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            TransportError::Status { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }

    /// Sanitize error message (remove sensitive info like credentials, internal IPs)
    pub fn sanitized_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Sanitize error messages by removing sensitive information
fn sanitize_error_message(msg: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static URL_CREDS_RE: OnceLock<Regex> = OnceLock::new();
    static INTERNAL_IP_RE: OnceLock<Regex> = OnceLock::new();
    static AUTH_HEADER_RE: OnceLock<Regex> = OnceLock::new();

    let url_creds_re = URL_CREDS_RE
        .get_or_init(|| Regex::new(r"https?://[^@:/]+:[^@/]+@").expect("valid regex"));
    let internal_ip_re = INTERNAL_IP_RE.get_or_init(|| {
        Regex::new(r"\b(10\.|172\.(1[6-9]|2[0-9]|3[01])\.|192\.168\.)\d+\.\d+\b")
            .expect("valid regex")
    });
    let auth_header_re = AUTH_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?i)(authorization:\s*bearer|bearer|api[_-]?key|token)\s*[:=]?\s*\S+")
            .expect("valid regex")
    });

    let sanitized = url_creds_re.replace_all(msg, "https://[REDACTED]@");
    let sanitized = internal_ip_re.replace_all(&sanitized, "[INTERNAL_IP]");
    let sanitized = auth_header_re.replace_all(&sanitized, "$1: [REDACTED]");

    sanitized.to_string()
}
