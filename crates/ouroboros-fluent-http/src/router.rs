//! Dynamic call routing
//!
//! [`HttpClient::call`](crate::HttpClient::call) accepts an open set of call
//! names. Each name is normalised to snake_case and classified against three
//! disjoint rule sets, in order:
//!
//! 1. request-shape names: a verb, optionally suffixed `_async` or `_json`
//! 2. response-read names: a fixed set of response accessors
//! 3. option-set names: anything in the [option registry](crate::registry)
//!
//! Names matching none of them are rejected with
//! [`HttpError::UnknownMethod`].

use crate::error::{HttpError, HttpResult};
use crate::method::HttpMethod;
use crate::registry;
use crate::transport::PendingResponse;
use crate::value::OptionValue;
use bytes::Bytes;
use regex::Regex;
use std::sync::OnceLock;

/// Dispatch path for a request-shape call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// `request`
    Plain,
    /// `request_async`
    Async,
    /// `request_json`
    Json,
}

/// Response accessor reachable through a dynamic call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseField {
    StatusCode,
    ReasonPhrase,
    ProtocolVersion,
    Headers,
    HasHeader,
    Header,
    HeaderLine,
    Body,
}

impl ResponseField {
    pub const ALL: [ResponseField; 8] = [
        Self::StatusCode,
        Self::ReasonPhrase,
        Self::ProtocolVersion,
        Self::Headers,
        Self::HasHeader,
        Self::Header,
        Self::HeaderLine,
        Self::Body,
    ];

    /// Snake-case call name
    pub fn name(&self) -> &'static str {
        match self {
            Self::StatusCode => "get_status_code",
            Self::ReasonPhrase => "get_reason_phrase",
            Self::ProtocolVersion => "get_protocol_version",
            Self::Headers => "get_headers",
            Self::HasHeader => "has_header",
            Self::Header => "get_header",
            Self::HeaderLine => "get_header_line",
            Self::Body => "get_body",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Whether the accessor takes a header name argument
    pub fn takes_name(&self) -> bool {
        matches!(self, Self::HasHeader | Self::Header | Self::HeaderLine)
    }

    /// Value returned when there is no response to read from
    pub fn absent_value(&self) -> OptionValue {
        match self {
            Self::HasHeader => OptionValue::Bool(false),
            _ => OptionValue::Null,
        }
    }
}

/// Classification of a dynamic call name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Request { method: HttpMethod, mode: RequestMode },
    Response(ResponseField),
    SetOption(&'static str),
}

/// What a dynamic call produced
#[derive(Debug)]
pub enum CallOutcome {
    /// A request was dispatched; the response (if any) is on the client
    Dispatched,
    /// An async request was started
    Pending(PendingResponse),
    /// A response accessor value
    Value(OptionValue),
    /// The response body
    Body(Option<Bytes>),
    /// An option was stored
    OptionSet,
}

impl CallOutcome {
    /// Accessor value, if this outcome carries one
    pub fn into_value(self) -> Option<OptionValue> {
        match self {
            CallOutcome::Value(value) => Some(value),
            CallOutcome::Body(body) => Some(body.map(OptionValue::Bytes).unwrap_or(OptionValue::Null)),
            _ => None,
        }
    }

    pub fn into_pending(self) -> Option<PendingResponse> {
        match self {
            CallOutcome::Pending(pending) => Some(pending),
            _ => None,
        }
    }
}

/// Convert a camelCase call name to snake_case; snake_case passes through.
///
/// `connectTimeout` becomes `connect_timeout`, `postJson` becomes `post_json`.
pub fn snake_case(name: &str) -> String {
    static BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();
    let boundary_re =
        BOUNDARY_RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

    boundary_re
        .replace_all(name.trim(), "${1}_${2}")
        .to_ascii_lowercase()
}

fn classify_request(name: &str) -> Option<Route> {
    if let Some(method) = HttpMethod::from_token(name) {
        return Some(Route::Request { method, mode: RequestMode::Plain });
    }

    let (verb, suffix) = name.rsplit_once('_')?;
    let method = HttpMethod::from_token(verb)?;
    let mode = match suffix {
        "async" => RequestMode::Async,
        "json" => RequestMode::Json,
        _ => return None,
    };
    Some(Route::Request { method, mode })
}

/// Classify a call name
pub fn classify(name: &str) -> HttpResult<Route> {
    let normalized = snake_case(name);

    if let Some(route) = classify_request(&normalized) {
        return Ok(route);
    }
    if let Some(field) = ResponseField::from_name(&normalized) {
        return Ok(Route::Response(field));
    }
    if let Some(option) = registry::lookup(&normalized) {
        return Ok(Route::SetOption(option));
    }

    Err(HttpError::UnknownMethod(name.to_string()))
}

/// Every request-shape call name, in snake_case
pub fn request_call_names() -> Vec<String> {
    let mut names = Vec::new();
    for method in HttpMethod::ALL {
        names.push(method.token().to_string());
        names.push(format!("{}_async", method.token()));
        names.push(format!("{}_json", method.token()));
    }
    names
}
