//! HTTP response types

use crate::error::{HttpError, HttpResult};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{StatusCode, Version};
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP response with built-in latency measurement
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    latency_ms: u64,
    url: String,
}

impl HttpResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Canonical reason phrase for the status code, empty for unknown codes
    pub fn reason_phrase(&self) -> &str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Protocol version without the `HTTP/` prefix, e.g. `1.1` or `2`
    pub fn protocol_version(&self) -> &'static str {
        match self.version {
            Version::HTTP_09 => "0.9",
            Version::HTTP_10 => "1.0",
            Version::HTTP_2 => "2",
            Version::HTTP_3 => "3",
            _ => "1.1",
        }
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// All headers, each name mapped to its values in arrival order
    pub fn headers(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &self.headers {
            out.entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        out
    }

    /// Raw header map
    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header presence check
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name.to_ascii_lowercase().as_str())
    }

    /// Every value of a header (case-insensitive), empty when absent
    pub fn header(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name.to_ascii_lowercase().as_str())
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect()
    }

    /// Values of a header joined with `, `, empty when absent
    pub fn header_line(&self, name: &str) -> String {
        self.header(name).join(", ")
    }

    /// Response body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Get body as JSON
    pub fn json(&self) -> HttpResult<serde_json::Value> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::MalformedJson(format!("Failed to parse JSON: {}", e)))
    }

    /// Get body as JSON and deserialize to type
    pub fn json_as<T: serde::de::DeserializeOwned>(&self) -> HttpResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::MalformedJson(format!("Failed to deserialize JSON: {}", e)))
    }

    /// Get latency as Duration
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    /// Final URL (may differ from request URL due to redirects)
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if content type is JSON
    pub fn is_json(&self) -> bool {
        self.header_line("content-type").contains("json")
    }
}

/// Builder for creating HttpResponse (transports and tests)
#[derive(Debug)]
pub struct HttpResponseBuilder {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    latency_ms: u64,
    url: String,
}

impl HttpResponseBuilder {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            latency_ms: 0,
            url: String::new(),
        }
    }

    /// Set the status; codes outside 100..=999 fall back to 500
    pub fn status_code(mut self, code: u16) -> Self {
        self.status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Append a header; invalid names or values are skipped
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn build(self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            version: self.version,
            headers: self.headers,
            body: self.body,
            latency_ms: self.latency_ms,
            url: self.url,
        }
    }
}

impl Default for HttpResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert reqwest Response to HttpResponse
pub async fn from_reqwest(
    response: reqwest::Response,
    latency_ms: u64,
) -> Result<HttpResponse, crate::error::TransportError> {
    let status = response.status();
    let version = response.version();
    let url = response.url().to_string();
    let headers = response.headers().clone();
    let body = response.bytes().await?;

    Ok(HttpResponse {
        status,
        version,
        headers,
        body,
        latency_ms,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_status_checks() {
        let response = HttpResponseBuilder::new().status_code(200).build();
        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert_eq!(response.reason_phrase(), "OK");

        let response = HttpResponseBuilder::new().status_code(404).build();
        assert!(!response.is_success());
        assert!(response.is_client_error());
        assert_eq!(response.reason_phrase(), "Not Found");

        let response = HttpResponseBuilder::new().status_code(500).build();
        assert!(response.is_server_error());
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponseBuilder::new()
            .body(r#"{"name": "Alice", "age": 30}"#)
            .build();

        let json = response.json().unwrap();
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["age"], 30);
    }

    #[test]
    fn test_response_malformed_json() {
        let response = HttpResponseBuilder::new().body("not json").build();
        assert!(matches!(response.json(), Err(HttpError::MalformedJson(_))));
    }

    #[test]
    fn test_response_headers_multi_valued_and_case_insensitive() {
        let response = HttpResponseBuilder::new()
            .header("Set-Cookie", "a=1")
            .header("set-cookie", "b=2")
            .header("Content-Type", "application/json")
            .build();

        assert!(response.has_header("SET-COOKIE"));
        assert!(!response.has_header("x-missing"));
        assert_eq!(response.header("set-cookie"), vec!["a=1", "b=2"]);
        assert_eq!(response.header_line("Set-Cookie"), "a=1, b=2");
        assert_eq!(response.header_line("x-missing"), "");
        assert_eq!(
            response.headers().get("content-type"),
            Some(&vec!["application/json".to_string()])
        );
        assert!(response.is_json());
    }

    #[test]
    fn test_protocol_version() {
        let response = HttpResponseBuilder::new().build();
        assert_eq!(response.protocol_version(), "1.1");

        let response = HttpResponseBuilder::new().version(Version::HTTP_2).build();
        assert_eq!(response.protocol_version(), "2");
    }
}
