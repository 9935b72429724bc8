//! Fluent HTTP client
//!
//! `HttpClient` accumulates request options through chained calls and
//! dispatches requests through a [`Transport`] using those options merged with
//! per-call overrides.

use crate::config::{self, ClientContext};
use crate::error::{HttpError, HttpResult};
use crate::method::{parse_wire_method, HttpMethod};
use crate::registry::ONE_SHOT_OPTIONS;
use crate::reqwest_transport::ReqwestTransport;
use crate::response::HttpResponse;
use crate::router::{self, CallOutcome, RequestMode, ResponseField, Route};
use crate::store::{deep_merge, remove_path, OptionStore};
use crate::transport::{PendingResponse, Transport};
use crate::value::{OptionMap, OptionValue};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Fluent HTTP client with persistent request options
///
/// Every dispatch clears the last response before the attempt. With
/// catch-errors enabled (the default) a transport failure leaves the client
/// without a response instead of returning an error.
///
/// # Example
///
/// ```ignore
/// use ouroboros_fluent_http::{option_map, HttpClient};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = HttpClient::new("https://httpbin.org")?;
///
///     let ip = client.fetch_json("/ip", "GET", Default::default()).await?;
///     println!("{:?}", ip);
///
///     client
///         .header("X-Request-Id", "abc")
///         .call("formParams", vec![json!({"user": "Elf"}).into()])
///         .await?;
///     client.request("/post", "POST", Default::default()).await?;
///     println!("{:?}", client.response().map(|r| r.status_code()));
///
///     Ok(())
/// }
/// ```
pub struct HttpClient {
    store: OptionStore,
    response: Option<HttpResponse>,
    catch_errors: bool,
    transport: Arc<dyn Transport>,
}

impl HttpClient {
    /// Create a client from a base URI or an options map, using the
    /// process-wide defaults and the reqwest transport
    pub fn new(input: impl Into<OptionValue>) -> HttpResult<Self> {
        Self::with_context(input, &ClientContext::global())
    }

    /// Create a client against explicit defaults
    pub fn with_context(input: impl Into<OptionValue>, context: &ClientContext) -> HttpResult<Self> {
        Self::with_transport(input, context, ReqwestTransport::new)
    }

    /// Create a client whose transport is built by `build` from the merged
    /// construction options. The transport's normalised configuration becomes
    /// the client's persistent options.
    pub fn with_transport<T, F>(
        input: impl Into<OptionValue>,
        context: &ClientContext,
        build: F,
    ) -> HttpResult<Self>
    where
        T: Transport,
        F: FnOnce(&OptionMap) -> HttpResult<T>,
    {
        let options = Self::input_options(input.into())?;
        let merged = OptionStore::with_defaults(context.defaults().clone(), options).into_map();

        let transport = build(&merged)?;
        let store = OptionStore::from(transport.config());

        debug!(base_uri = ?store.get("base_uri"), "HTTP client created");

        Ok(Self {
            store,
            response: None,
            catch_errors: true,
            transport: Arc::new(transport),
        })
    }

    fn input_options(input: OptionValue) -> HttpResult<OptionMap> {
        match input {
            OptionValue::String(uri) => {
                let mut options = OptionMap::new();
                options.insert("base_uri".to_string(), OptionValue::String(uri));
                Ok(options)
            }
            OptionValue::Map(options) => Ok(options),
            other => Err(HttpError::InvalidArgument(format!(
                "client input must be a URI string or an options map, got {:?}",
                other
            ))),
        }
    }

    /// Process-wide default options used by [`HttpClient::new`]
    pub fn default_options() -> OptionMap {
        config::default_options()
    }

    /// Replace the process-wide default options. Existing clients are unaffected.
    pub fn set_default_options(options: OptionMap) {
        config::set_default_options(options);
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Whether transport failures are swallowed
    pub fn are_errors_caught(&self) -> bool {
        self.catch_errors
    }

    /// Swallow (`true`) or propagate (`false`) transport failures
    pub fn catch_errors(&mut self, catch: bool) -> &mut Self {
        self.catch_errors = catch;
        self
    }

    // Options

    pub fn options(&self) -> &OptionMap {
        self.store.as_map()
    }

    /// Get an option using dotted notation
    pub fn option(&self, path: &str) -> Option<&OptionValue> {
        self.store.get(path)
    }

    pub fn option_or(&self, path: &str, default: OptionValue) -> OptionValue {
        self.store.get_or(path, default)
    }

    /// Set an option using dotted notation
    pub fn set_option(&mut self, path: &str, value: impl Into<OptionValue>) -> &mut Self {
        self.store.set(path, value);
        self
    }

    /// Set several options, each key in dotted notation
    pub fn set_options_many(&mut self, entries: OptionMap) -> &mut Self {
        self.store.set_many(entries);
        self
    }

    /// Replace all options
    pub fn set_options(&mut self, options: OptionMap) -> &mut Self {
        self.store.replace(options);
        self
    }

    /// Deep-merge options into the persistent options. Headers replace
    /// stored headers of the same name regardless of case.
    pub fn merge_options(&mut self, options: OptionMap) -> &mut Self {
        let mut merged = std::mem::take(&mut self.store).into_map();
        drop_shadowed_headers(&mut merged, &options);
        deep_merge(&mut merged, options);
        self.store = OptionStore::from(merged);
        self
    }

    pub fn remove_option(&mut self, path: &str) -> &mut Self {
        self.store.remove(path);
        self
    }

    pub fn remove_options<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.remove_many(paths);
        self
    }

    pub fn clear_options(&mut self) -> &mut Self {
        self.store.clear();
        self
    }

    /// Set a persistent header, replacing any stored header of the same
    /// name regardless of case
    pub fn header(&mut self, name: &str, value: impl Into<OptionValue>) -> &mut Self {
        if let Some(headers) = self.store.get_mut("headers").and_then(OptionValue::as_map_mut) {
            headers.retain(|stored, _| !stored.eq_ignore_ascii_case(name));
        }
        self.set_option(&format!("headers.{}", name), value)
    }

    pub fn content_type(&mut self, content_type: &str) -> &mut Self {
        self.header("Content-Type", content_type)
    }

    pub fn accept(&mut self, accept: &str) -> &mut Self {
        self.header("Accept", accept)
    }

    pub fn accept_json(&mut self) -> &mut Self {
        self.accept(JSON_MEDIA_TYPE)
    }

    pub fn user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.header("User-Agent", user_agent)
    }

    /// Where the next response body is written: a file path or a
    /// [`BodySink`](crate::BodySink) handle
    pub fn save_to(&mut self, destination: impl Into<OptionValue>) -> &mut Self {
        self.store.remove("save_to");
        self.set_option("sink", destination)
    }

    // Dispatch

    /// Effective options for one dispatch, consuming one-shot options from
    /// the persistent store
    fn prepare(&mut self, method: &str, overrides: OptionMap) -> HttpResult<(http::Method, OptionMap)> {
        let method = parse_wire_method(method)?;
        let mut effective = self.store.as_map().clone();
        drop_shadowed_headers(&mut effective, &overrides);
        deep_merge(&mut effective, overrides);
        self.consume_one_shot();
        Ok((method, effective))
    }

    fn consume_one_shot(&mut self) {
        let mut options = std::mem::take(&mut self.store).into_map();

        for path in ONE_SHOT_OPTIONS {
            match path.strip_prefix("headers.") {
                Some(header) => {
                    if let Some(headers) = options.get_mut("headers").and_then(OptionValue::as_map_mut) {
                        headers.retain(|name, _| !name.eq_ignore_ascii_case(header));
                    }
                }
                None => {
                    remove_path(&mut options, path);
                }
            }
        }

        self.store = OptionStore::from(options);
    }

    /// Send a request and record its response.
    ///
    /// `uri` is resolved against `base_uri`; an empty URI targets the base
    /// URI itself. Returns the client for chained response reads.
    #[instrument(skip_all, fields(method = %method, uri = %uri))]
    pub async fn request(&mut self, uri: &str, method: &str, overrides: OptionMap) -> HttpResult<&mut Self> {
        self.response = None;
        let (method, effective) = self.prepare(method, overrides)?;

        match self.transport.send(method, uri, effective).await {
            Ok(response) => {
                debug!(
                    status = response.status_code(),
                    latency_ms = response.latency_ms(),
                    "Request complete"
                );
                self.response = Some(response);
            }
            Err(err) if self.catch_errors => {
                warn!(
                    category = ?err.category(),
                    error = %err.sanitized_message(),
                    "Request failed, error caught"
                );
            }
            Err(err) => return Err(err.into()),
        }

        Ok(self)
    }

    /// [`request`](Self::request) with JSON added to the `Accept` header.
    ///
    /// An `Accept` value that already admits JSON (`/json` or `+json`) is
    /// kept; otherwise `application/json,` is prepended. The persistent
    /// options are not modified.
    pub async fn request_json(
        &mut self,
        uri: &str,
        method: &str,
        mut overrides: OptionMap,
    ) -> HttpResult<&mut Self> {
        self.apply_json_accept(&mut overrides);
        self.request(uri, method, overrides).await
    }

    /// Start a request without waiting for it.
    ///
    /// The returned future does not borrow the client and does not update
    /// [`response`](Self::response); transport failures are always returned
    /// through it regardless of the catch-errors policy.
    pub fn request_async(
        &mut self,
        uri: &str,
        method: &str,
        overrides: OptionMap,
    ) -> HttpResult<PendingResponse> {
        let (method, effective) = self.prepare(method, overrides)?;
        debug!(method = %method, uri, "Async request started");
        Ok(PendingResponse::new(
            Arc::clone(&self.transport),
            method,
            uri.to_string(),
            effective,
        ))
    }

    pub async fn send(&mut self, method: HttpMethod, uri: &str, overrides: OptionMap) -> HttpResult<&mut Self> {
        self.request(uri, method.as_str(), overrides).await
    }

    pub async fn send_json(
        &mut self,
        method: HttpMethod,
        uri: &str,
        overrides: OptionMap,
    ) -> HttpResult<&mut Self> {
        self.request_json(uri, method.as_str(), overrides).await
    }

    pub fn send_async(
        &mut self,
        method: HttpMethod,
        uri: &str,
        overrides: OptionMap,
    ) -> HttpResult<PendingResponse> {
        self.request_async(uri, method.as_str(), overrides)
    }

    fn apply_json_accept(&self, overrides: &mut OptionMap) {
        let from_overrides = find_header(overrides.get("headers"), "Accept");
        let from_store = find_header(self.store.get("headers"), "Accept");

        let (name, current) = match from_overrides.or(from_store) {
            Some((name, value)) => (name.to_string(), header_text(value)),
            None => ("Accept".to_string(), None),
        };

        let accept = json_accept_value(current.as_deref());
        let headers = overrides
            .entry("headers".to_string())
            .or_insert_with(|| OptionValue::Map(OptionMap::new()));
        if !headers.is_map() {
            *headers = OptionValue::Map(OptionMap::new());
        }
        if let Some(headers) = headers.as_map_mut() {
            headers.insert(name, OptionValue::String(accept));
        }
    }

    // Response

    /// Last response, absent before the first request and after a caught failure
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Body of the last response as text; `None` when there is no response
    pub fn content(&self) -> Option<String> {
        self.response.as_ref().map(HttpResponse::text)
    }

    /// Decode the last response body as JSON; `None` when there is no response
    pub fn json(&self) -> HttpResult<Option<serde_json::Value>> {
        self.response.as_ref().map(HttpResponse::json).transpose()
    }

    pub fn json_as<T: serde::de::DeserializeOwned>(&self) -> HttpResult<Option<T>> {
        self.response
            .as_ref()
            .map(HttpResponse::json_as::<T>)
            .transpose()
    }

    /// Request the URI and return the response content
    pub async fn fetch_content(
        &mut self,
        uri: &str,
        method: &str,
        overrides: OptionMap,
    ) -> HttpResult<Option<String>> {
        Ok(self.request(uri, method, overrides).await?.content())
    }

    /// Request the URI expecting JSON and return the decoded content
    pub async fn fetch_json(
        &mut self,
        uri: &str,
        method: &str,
        overrides: OptionMap,
    ) -> HttpResult<Option<serde_json::Value>> {
        self.request_json(uri, method, overrides).await?.json()
    }

    // Dynamic calls

    /// Route a call by name: a verb (optionally `Async`/`Json` suffixed)
    /// sends a request, a response accessor reads the last response, and a
    /// registered option name sets that option.
    ///
    /// Verb calls take `[uri?, overrides?]`; header accessors take
    /// `[name]`; option setters take `[value]`.
    pub async fn call(&mut self, name: &str, args: Vec<OptionValue>) -> HttpResult<CallOutcome> {
        match router::classify(name)? {
            Route::Request { method, mode } => {
                let (uri, overrides) = request_args(name, args)?;
                match mode {
                    RequestMode::Plain => {
                        self.send(method, &uri, overrides).await?;
                        Ok(CallOutcome::Dispatched)
                    }
                    RequestMode::Json => {
                        self.send_json(method, &uri, overrides).await?;
                        Ok(CallOutcome::Dispatched)
                    }
                    RequestMode::Async => Ok(CallOutcome::Pending(self.send_async(method, &uri, overrides)?)),
                }
            }
            Route::Response(field) => self.read_response(name, field, &args),
            Route::SetOption(option) => {
                let value = args
                    .into_iter()
                    .next()
                    .ok_or_else(|| HttpError::MissingArgument(format!("{} requires a value", name)))?;
                self.set_option(option, value);
                Ok(CallOutcome::OptionSet)
            }
        }
    }

    fn read_response(&self, name: &str, field: ResponseField, args: &[OptionValue]) -> HttpResult<CallOutcome> {
        let header_name = if field.takes_name() {
            let header = args
                .first()
                .and_then(OptionValue::to_text)
                .ok_or_else(|| HttpError::MissingArgument(format!("{} requires a header name", name)))?;
            Some(header)
        } else {
            None
        };
        let header_name = header_name.as_deref().unwrap_or_default();

        let Some(response) = &self.response else {
            return Ok(match field {
                ResponseField::Body => CallOutcome::Body(None),
                _ => CallOutcome::Value(field.absent_value()),
            });
        };

        let value = match field {
            ResponseField::StatusCode => OptionValue::Int(i64::from(response.status_code())),
            ResponseField::ReasonPhrase => response.reason_phrase().into(),
            ResponseField::ProtocolVersion => response.protocol_version().into(),
            ResponseField::Headers => OptionValue::Map(
                response
                    .headers()
                    .into_iter()
                    .map(|(name, values)| (name, OptionValue::from(values)))
                    .collect(),
            ),
            ResponseField::HasHeader => response.has_header(header_name).into(),
            ResponseField::Header => response.header(header_name).into(),
            ResponseField::HeaderLine => response.header_line(header_name).into(),
            ResponseField::Body => return Ok(CallOutcome::Body(Some(response.body().clone()))),
        };

        Ok(CallOutcome::Value(value))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_uri", &self.store.get("base_uri"))
            .field("catch_errors", &self.catch_errors)
            .field("has_response", &self.response.is_some())
            .finish()
    }
}

/// Create a client from a base URI or an options map
pub fn http_client(input: impl Into<OptionValue>) -> HttpResult<HttpClient> {
    HttpClient::new(input)
}

fn request_args(name: &str, args: Vec<OptionValue>) -> HttpResult<(String, OptionMap)> {
    let mut args = args.into_iter();

    let uri = match args.next() {
        None | Some(OptionValue::Null) => String::new(),
        Some(OptionValue::String(uri)) => uri,
        Some(other) => {
            return Err(HttpError::InvalidArgument(format!(
                "{} expects a URI string, got {:?}",
                name, other
            )))
        }
    };
    let overrides = match args.next() {
        None | Some(OptionValue::Null) => OptionMap::new(),
        Some(OptionValue::Map(overrides)) => overrides,
        Some(other) => {
            return Err(HttpError::InvalidArgument(format!(
                "{} expects an options map, got {:?}",
                name, other
            )))
        }
    };

    Ok((uri, overrides))
}

/// Remove headers from `base` that `overrides` sets under any casing, so
/// the override replaces them instead of being sent alongside
fn drop_shadowed_headers(base: &mut OptionMap, overrides: &OptionMap) {
    let Some(incoming) = overrides.get("headers").and_then(OptionValue::as_map) else {
        return;
    };
    if let Some(headers) = base.get_mut("headers").and_then(OptionValue::as_map_mut) {
        headers.retain(|name, _| !incoming.keys().any(|key| key.eq_ignore_ascii_case(name)));
    }
}

fn find_header<'a>(headers: Option<&'a OptionValue>, name: &str) -> Option<(&'a str, &'a OptionValue)> {
    headers?
        .as_map()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(key, value)| (key.as_str(), value))
}

fn header_text(value: &OptionValue) -> Option<String> {
    match value {
        OptionValue::List(items) => {
            let parts: Vec<String> = items.iter().filter_map(OptionValue::to_text).collect();
            (!parts.is_empty()).then(|| parts.join(","))
        }
        other => other.to_text(),
    }
}

/// Whether an `Accept` value already admits a JSON media type
pub fn accepts_json(accept: &str) -> bool {
    let accept = accept.to_ascii_lowercase();
    accept.contains("/json") || accept.contains("+json")
}

/// `Accept` value for a JSON request given the current value
pub fn json_accept_value(current: Option<&str>) -> String {
    match current.map(str::trim).filter(|value| !value.is_empty()) {
        None => JSON_MEDIA_TYPE.to_string(),
        Some(value) if accepts_json(value) => value.to_string(),
        Some(value) => format!("{},{}", JSON_MEDIA_TYPE, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::option_map;
    use serde_json::json;

    fn client(input: impl Into<OptionValue>) -> HttpClient {
        HttpClient::with_context(input, &ClientContext::default()).unwrap()
    }

    #[test]
    fn test_client_from_uri() {
        let client = client("http://example.com");
        assert_eq!(client.option("base_uri"), Some(&OptionValue::from("http://example.com")));
        assert_eq!(client.option("connect_timeout"), Some(&OptionValue::Int(5)));
        assert_eq!(client.option("timeout"), Some(&OptionValue::Int(25)));
        assert!(client.are_errors_caught());
        assert!(client.response().is_none());
    }

    #[test]
    fn test_client_from_url() {
        let url = url::Url::parse("https://api.example.com/v1/").unwrap();
        let client = client(url);
        assert_eq!(client.option("base_uri"), Some(&OptionValue::from("https://api.example.com/v1/")));
    }

    #[test]
    fn test_client_from_options_overrides_defaults() {
        let client = client(json!({"timeout": 3, "foo": "bar"}));
        assert_eq!(client.option("timeout"), Some(&OptionValue::Int(3)));
        assert_eq!(client.option("foo"), Some(&OptionValue::from("bar")));
        assert_eq!(client.option("connect_timeout"), Some(&OptionValue::Int(5)));
    }

    #[test]
    fn test_client_rejects_other_input() {
        let result = HttpClient::with_context(42, &ClientContext::default());
        assert!(matches!(result, Err(HttpError::InvalidArgument(_))));

        let result = HttpClient::with_context(vec!["http://example.com"], &ClientContext::default());
        assert!(matches!(result, Err(HttpError::InvalidArgument(_))));
    }

    #[test]
    fn test_header_setters() {
        let mut client = client(OptionMap::new());
        client
            .header("X-Foo", "bar")
            .content_type("text/plain")
            .accept_json()
            .user_agent("tests/1.0");

        assert_eq!(
            client.option("headers"),
            Some(&OptionValue::from(json!({
                "X-Foo": "bar",
                "Content-Type": "text/plain",
                "Accept": "application/json",
                "User-Agent": "tests/1.0"
            })))
        );
    }

    #[test]
    fn test_option_management() {
        let mut client = client(OptionMap::new());
        client
            .set_option("auth", vec!["user", "pass"])
            .set_options_many(option_map(json!({"headers.X-A": "1", "debug": true})))
            .merge_options(option_map(json!({"headers": {"X-B": "2"}})));

        assert_eq!(client.option("headers.X-A"), Some(&OptionValue::from("1")));
        assert_eq!(client.option("headers.X-B"), Some(&OptionValue::from("2")));

        client.remove_options(["debug", "headers.X-A", "missing"]);
        assert!(client.option("debug").is_none());
        assert!(client.option("headers.X-A").is_none());
        assert_eq!(client.option_or("missing", OptionValue::Int(7)), OptionValue::Int(7));

        client.set_options(option_map(json!({"only": true})));
        assert_eq!(client.options(), &option_map(json!({"only": true})));

        client.clear_options();
        assert!(client.options().is_empty());
    }

    #[test]
    fn test_save_to_replaces_legacy_option() {
        let mut client = client(json!({"save_to": "/tmp/old"}));
        client.save_to("/tmp/new");

        assert!(client.option("save_to").is_none());
        assert_eq!(client.option("sink"), Some(&OptionValue::from("/tmp/new")));
    }

    #[test]
    fn test_header_names_replace_regardless_of_case() {
        let mut client = client(OptionMap::new());
        client.header("Accept", "text/html").header("X-Keep", "1");
        client.header("accept", "foo/bar");

        assert_eq!(
            client.option("headers"),
            Some(&OptionValue::from(json!({"accept": "foo/bar", "X-Keep": "1"})))
        );

        client.merge_options(option_map(json!({"headers": {"x-keep": "2"}})));
        assert_eq!(
            client.option("headers"),
            Some(&OptionValue::from(json!({"accept": "foo/bar", "x-keep": "2"})))
        );
    }

    #[test]
    fn test_drop_shadowed_headers() {
        let mut base = option_map(json!({"headers": {"Accept": "text/html", "X-Trace": "stored", "X-Other": "1"}}));
        drop_shadowed_headers(&mut base, &option_map(json!({"headers": {"accept": "x", "X-TRACE": "y"}})));
        assert_eq!(base, option_map(json!({"headers": {"X-Other": "1"}})));

        let mut untouched = option_map(json!({"headers": {"Accept": "text/html"}}));
        drop_shadowed_headers(&mut untouched, &option_map(json!({"timeout": 1})));
        assert_eq!(untouched, option_map(json!({"headers": {"Accept": "text/html"}})));
    }

    #[test]
    fn test_json_accept_value() {
        assert_eq!(json_accept_value(None), "application/json");
        assert_eq!(json_accept_value(Some("")), "application/json");
        assert_eq!(json_accept_value(Some("foo/bar")), "application/json,foo/bar");
        assert_eq!(json_accept_value(Some("application/json")), "application/json");
        assert_eq!(
            json_accept_value(Some("application/vnd.api+json")),
            "application/vnd.api+json"
        );
    }

    #[test]
    fn test_apply_json_accept_keeps_store_untouched() {
        let mut client = client(OptionMap::new());
        client.header("accept", "text/html");

        let mut overrides = OptionMap::new();
        client.apply_json_accept(&mut overrides);

        assert_eq!(
            overrides,
            option_map(json!({"headers": {"accept": "application/json,text/html"}}))
        );
        assert_eq!(client.option("headers.accept"), Some(&OptionValue::from("text/html")));
    }

    #[test]
    fn test_content_and_json_without_response() {
        let client = client(OptionMap::new());
        assert_eq!(client.content(), None);
        assert!(client.json().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_call_sets_registered_options() {
        let mut client = client(OptionMap::new());

        let outcome = client.call("connectTimeout", vec![OptionValue::Int(9)]).await.unwrap();
        assert!(matches!(outcome, CallOutcome::OptionSet));
        assert_eq!(client.option("connect_timeout"), Some(&OptionValue::Int(9)));

        client.call("httpErrors", vec![false.into()]).await.unwrap();
        assert_eq!(client.option("http_errors"), Some(&OptionValue::Bool(false)));
    }

    #[tokio::test]
    async fn test_call_routing_errors() {
        let mut client = client(OptionMap::new());

        assert!(matches!(
            client.call("notAnOption", vec![1.into()]).await,
            Err(HttpError::UnknownMethod(_))
        ));
        assert!(matches!(
            client.call("timeout", vec![]).await,
            Err(HttpError::MissingArgument(_))
        ));
        assert!(matches!(
            client.call("getHeader", vec![]).await,
            Err(HttpError::MissingArgument(_))
        ));
        assert!(matches!(
            client.call("post", vec![OptionValue::Int(1)]).await,
            Err(HttpError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_call_response_reads_without_response() {
        let mut client = client(OptionMap::new());

        let status = client.call("getStatusCode", vec![]).await.unwrap().into_value();
        assert_eq!(status, Some(OptionValue::Null));

        let has = client.call("hasHeader", vec!["Date".into()]).await.unwrap().into_value();
        assert_eq!(has, Some(OptionValue::Bool(false)));

        let body = client.call("getBody", vec![]).await.unwrap();
        assert!(matches!(body, CallOutcome::Body(None)));
    }

    #[tokio::test]
    async fn test_invalid_method_is_never_caught() {
        let mut client = client("http://127.0.0.1:9");
        let result = client.request("/", "bad method", OptionMap::new()).await;
        assert!(matches!(result, Err(HttpError::InvalidArgument(_))));
    }
}
