//! Default transport backed by `reqwest`

use crate::config::duration_from_secs;
use crate::error::{HttpError, TransportError};
use crate::registry::CLIENT_LEVEL_OPTIONS;
use crate::response::{from_reqwest, HttpResponse};
use crate::transport::{BodySink, Transport};
use crate::value::{OptionMap, OptionValue};
use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use parking_lot::Mutex;
use reqwest::cookie::Jar;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Options with no reqwest equivalent; accepted and ignored
const IGNORED_OPTIONS: &[&str] = &[
    "cert",
    "debug",
    "expect",
    "force_ip_resolve",
    "idn_conversion",
    "on_headers",
    "on_stats",
    "progress",
    "read_timeout",
    "ssl_key",
    "stream",
    "synchronous",
];

fn default_user_agent() -> &'static str {
    concat!("ouroboros-fluent-http/", env!("CARGO_PKG_VERSION"))
}

/// TLS verification mode
#[derive(Debug, Clone, PartialEq)]
enum Verify {
    Enabled,
    Disabled,
    /// Trust the PEM bundle at this path in addition to the system roots
    CaBundle(String),
}

#[derive(Debug, Clone, PartialEq)]
enum ProxySettings {
    /// Proxies from the environment
    System,
    Disabled,
    All(String),
    PerScheme {
        http: Option<String>,
        https: Option<String>,
    },
}

/// Cookie handling of the underlying client
#[derive(Debug, Clone)]
enum Cookies {
    Disabled,
    /// Cookies live as long as the `reqwest::Client` that received them
    Session,
    /// Jar shared through an `Arc<Jar>` handle
    Jar(Arc<Jar>),
}

impl PartialEq for Cookies {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cookies::Disabled, Cookies::Disabled) | (Cookies::Session, Cookies::Session) => true,
            (Cookies::Jar(a), Cookies::Jar(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Options that shape the underlying `reqwest::Client`
#[derive(Debug, Clone, PartialEq)]
struct ClientSettings {
    connect_timeout: Option<Duration>,
    /// `None` disables redirects
    max_redirects: Option<usize>,
    decode_content: bool,
    verify: Verify,
    proxy: ProxySettings,
    cookies: Cookies,
}

impl ClientSettings {
    fn from_options(options: &OptionMap) -> Result<Self, TransportError> {
        let connect_timeout = options
            .get("connect_timeout")
            .and_then(duration_from_secs)
            .filter(|timeout| !timeout.is_zero());

        let max_redirects = match options.get("allow_redirects") {
            None | Some(OptionValue::Bool(true)) => Some(DEFAULT_MAX_REDIRECTS),
            Some(OptionValue::Bool(false)) => None,
            Some(OptionValue::Map(redirects)) => Some(
                redirects
                    .get("max")
                    .and_then(OptionValue::as_i64)
                    .map(|max| max.max(0) as usize)
                    .unwrap_or(DEFAULT_MAX_REDIRECTS),
            ),
            Some(other) => {
                return Err(TransportError::InvalidRequest(format!(
                    "allow_redirects must be a bool or a map, got {:?}",
                    other
                )))
            }
        };

        // A string selects specific encodings; anything but `false` enables decoding
        let decode_content = !matches!(options.get("decode_content"), Some(OptionValue::Bool(false)));

        let verify = match options.get("verify") {
            None | Some(OptionValue::Bool(true)) => Verify::Enabled,
            Some(OptionValue::Bool(false)) => Verify::Disabled,
            Some(OptionValue::String(path)) => Verify::CaBundle(path.clone()),
            Some(other) => {
                return Err(TransportError::InvalidRequest(format!(
                    "verify must be a bool or a CA bundle path, got {:?}",
                    other
                )))
            }
        };

        let proxy = match options.get("proxy") {
            None | Some(OptionValue::Null) => ProxySettings::System,
            Some(OptionValue::Bool(false)) => ProxySettings::Disabled,
            Some(OptionValue::String(url)) => ProxySettings::All(url.clone()),
            Some(OptionValue::Map(schemes)) => ProxySettings::PerScheme {
                http: schemes.get("http").and_then(OptionValue::as_str).map(str::to_string),
                https: schemes.get("https").and_then(OptionValue::as_str).map(str::to_string),
            },
            Some(other) => {
                return Err(TransportError::InvalidRequest(format!(
                    "proxy must be a URL or a scheme map, got {:?}",
                    other
                )))
            }
        };

        let cookies = match options.get("cookies") {
            None | Some(OptionValue::Null) | Some(OptionValue::Bool(false)) => Cookies::Disabled,
            Some(OptionValue::Bool(true)) => Cookies::Session,
            Some(OptionValue::Handle(handle)) => {
                let jar = handle.downcast_ref::<Arc<Jar>>().ok_or_else(|| {
                    TransportError::InvalidRequest(format!(
                        "cookies handle must wrap Arc<reqwest::cookie::Jar>, got {}",
                        handle.type_name()
                    ))
                })?;
                Cookies::Jar(Arc::clone(jar))
            }
            Some(other) => {
                return Err(TransportError::InvalidRequest(format!(
                    "cookies must be a bool or a cookie jar handle, got {:?}",
                    other
                )))
            }
        };

        Ok(Self {
            connect_timeout,
            max_redirects,
            decode_content,
            verify,
            proxy,
            cookies,
        })
    }

    fn ca_bundle_path(&self) -> Option<&str> {
        match &self.verify {
            Verify::CaBundle(path) => Some(path.as_str()),
            _ => None,
        }
    }

    /// Build a client; `ca_bundle` holds the PEM contents when `verify`
    /// names a CA bundle
    fn build_client(&self, ca_bundle: Option<&[u8]>) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(default_user_agent());

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        // Configure redirects
        builder = match self.max_redirects {
            Some(max) => builder.redirect(reqwest::redirect::Policy::limited(max)),
            None => builder.redirect(reqwest::redirect::Policy::none()),
        };

        // Configure compression
        builder = builder.gzip(self.decode_content).brotli(self.decode_content);

        match &self.verify {
            Verify::Enabled => {}
            Verify::Disabled => {
                builder = builder
                    .danger_accept_invalid_certs(true)
                    .danger_accept_invalid_hostnames(true);
            }
            Verify::CaBundle(path) => {
                let pem = ca_bundle.ok_or_else(|| {
                    TransportError::InvalidRequest(format!("CA bundle {} was not loaded", path))
                })?;
                builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
            }
        }

        match &self.proxy {
            ProxySettings::System => {}
            ProxySettings::Disabled => {
                builder = builder.no_proxy();
            }
            ProxySettings::All(url) => {
                builder = builder.proxy(reqwest::Proxy::all(url.as_str())?);
            }
            ProxySettings::PerScheme { http, https } => {
                if let Some(url) = http {
                    builder = builder.proxy(reqwest::Proxy::http(url.as_str())?);
                }
                if let Some(url) = https {
                    builder = builder.proxy(reqwest::Proxy::https(url.as_str())?);
                }
            }
        }

        match &self.cookies {
            Cookies::Disabled => {}
            Cookies::Session => {
                builder = builder.cookie_store(true);
            }
            Cookies::Jar(jar) => {
                builder = builder.cookie_provider(Arc::clone(jar));
            }
        }

        Ok(builder.build()?)
    }
}

/// [`Transport`] implementation on top of a pooled `reqwest::Client`
///
/// # Example
///
/// ```ignore
/// use ouroboros_fluent_http::HttpClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = HttpClient::new("https://httpbin.org")?;
///     client.header("X-Foo", "bar").request("/headers", "GET", Default::default()).await?;
///     println!("{:?}", client.json()?);
///     Ok(())
/// }
/// ```
pub struct ReqwestTransport {
    client: reqwest::Client,
    settings: ClientSettings,
    /// Clients for requests whose client-level options differ from `settings`
    dedicated: Mutex<Vec<(ClientSettings, reqwest::Client)>>,
    config: OptionMap,
}

impl ReqwestTransport {
    /// Build a transport from construction options.
    ///
    /// Missing options are filled with the transport defaults
    /// (`allow_redirects`, `http_errors`, `decode_content`, `verify`,
    /// `cookies`); the result is what [`Transport::config`] reports.
    pub fn new(options: &OptionMap) -> Result<Self, HttpError> {
        if let Some(base_uri) = options.get("base_uri") {
            let valid = base_uri.as_str().map(|uri| Url::parse(uri).is_ok()).unwrap_or(false);
            if !valid {
                return Err(HttpError::InvalidArgument(format!(
                    "base_uri must be an absolute URL, got {:?}",
                    base_uri
                )));
            }
        }

        let mut config = options.clone();
        for (key, value) in Self::defaults() {
            config.entry(key).or_insert(value);
        }

        let settings = ClientSettings::from_options(&config)
            .map_err(|e| HttpError::InvalidArgument(e.to_string()))?;
        let ca_bundle = match settings.ca_bundle_path() {
            Some(path) => Some(std::fs::read(path).map_err(|e| {
                HttpError::InvalidArgument(format!("Cannot read CA bundle {}: {}", path, e))
            })?),
            None => None,
        };
        let client = settings
            .build_client(ca_bundle.as_deref())
            .map_err(|e| HttpError::InvalidArgument(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            dedicated: Mutex::new(Vec::new()),
            config,
        })
    }

    fn defaults() -> OptionMap {
        let mut redirects = OptionMap::new();
        redirects.insert("max".into(), OptionValue::Int(DEFAULT_MAX_REDIRECTS as i64));

        let mut defaults = OptionMap::new();
        defaults.insert("allow_redirects".into(), redirects.into());
        defaults.insert("http_errors".into(), true.into());
        defaults.insert("decode_content".into(), true.into());
        defaults.insert("verify".into(), true.into());
        defaults.insert("cookies".into(), false.into());
        defaults
    }

    /// Reuse the pooled client unless this request changes connection-level
    /// options. Dedicated clients are cached per settings so their
    /// connections and cookies carry over to later requests.
    async fn client_for(&self, options: &OptionMap) -> Result<reqwest::Client, TransportError> {
        let settings = ClientSettings::from_options(options)?;
        if settings == self.settings {
            return Ok(self.client.clone());
        }
        if let Some(client) = self.cached_client(&settings) {
            return Ok(client);
        }

        let ca_bundle = match settings.ca_bundle_path() {
            Some(path) => Some(tokio::fs::read(path).await.map_err(|e| {
                TransportError::InvalidRequest(format!("Cannot read CA bundle {}: {}", path, e))
            })?),
            None => None,
        };

        let changed: Vec<&str> = CLIENT_LEVEL_OPTIONS
            .iter()
            .copied()
            .filter(|name| options.get(*name) != self.config.get(*name))
            .collect();
        debug!(?changed, "Building dedicated client for request");
        let client = settings.build_client(ca_bundle.as_deref())?;

        let mut dedicated = self.dedicated.lock();
        if let Some((_, existing)) = dedicated.iter().find(|(cached, _)| *cached == settings) {
            return Ok(existing.clone());
        }
        dedicated.push((settings, client.clone()));
        Ok(client)
    }

    fn cached_client(&self, settings: &ClientSettings) -> Option<reqwest::Client> {
        self.dedicated
            .lock()
            .iter()
            .find(|(cached, _)| cached == settings)
            .map(|(_, client)| client.clone())
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_uri", &self.config.get("base_uri"))
            .field("settings", &self.settings)
            .field("dedicated_clients", &self.dedicated.lock().len())
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn config(&self) -> OptionMap {
        self.config.clone()
    }

    #[instrument(skip_all, fields(method = %method, uri = %uri))]
    async fn send(
        &self,
        method: http::Method,
        uri: &str,
        options: OptionMap,
    ) -> Result<HttpResponse, TransportError> {
        for name in IGNORED_OPTIONS {
            if matches!(options.get(*name), Some(value) if !value.is_null()) {
                debug!(option = name, "Option not supported by reqwest transport, ignored");
            }
        }

        if let Some(delay) = options.get("delay").and_then(delay_from_millis) {
            tokio::time::sleep(delay).await;
        }

        let mut url = resolve_uri(options.get("base_uri"), uri)?;
        apply_query(&mut url, options.get("query"))?;

        let client = self.client_for(&options).await?;
        let mut builder = client.request(method, url);
        builder = apply_headers(builder, options.get("headers"))?;
        builder = apply_body(builder, &options)?;
        builder = apply_auth(builder, options.get("auth"))?;

        if let Some(timeout) = options.get("timeout").and_then(duration_from_secs) {
            if !timeout.is_zero() {
                builder = builder.timeout(timeout);
            }
        }
        if let Some(version) = options.get("version") {
            builder = builder.version(parse_version(version)?);
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let latency_ms = start.elapsed().as_millis() as u64;
        let response = from_reqwest(response, latency_ms).await?;

        debug!(status = response.status_code(), latency_ms, "Response received");

        if let Some(sink) = options.get("sink").or_else(|| options.get("save_to")) {
            write_sink(sink, response.body()).await?;
        }

        let http_errors = options
            .get("http_errors")
            .and_then(OptionValue::as_bool)
            .unwrap_or(true);
        if http_errors && response.status_code() >= 400 {
            return Err(TransportError::Status {
                status: response.status_code(),
                reason: response.reason_phrase().to_string(),
                response: Box::new(response),
            });
        }

        Ok(response)
    }
}

/// Read the `delay` option (milliseconds). Zero, negative, non-finite and
/// out-of-range values yield `None`.
fn delay_from_millis(value: &OptionValue) -> Option<Duration> {
    let millis = value.as_f64()?;
    Duration::try_from_secs_f64(millis / 1000.0)
        .ok()
        .filter(|delay| !delay.is_zero())
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else if err.is_redirect() {
        TransportError::Redirect(err.to_string())
    } else {
        TransportError::Reqwest(err)
    }
}

/// Resolve `uri` against `base_uri` (RFC 3986). An empty URI means the base
/// URI itself; absolute URIs ignore the base.
fn resolve_uri(base_uri: Option<&OptionValue>, uri: &str) -> Result<Url, TransportError> {
    if let Ok(absolute) = Url::parse(uri) {
        return Ok(absolute);
    }

    match base_uri.and_then(OptionValue::as_str) {
        Some(base) => Ok(Url::parse(base)?.join(uri)?),
        None if uri.is_empty() => Err(TransportError::InvalidUrl(
            "no request URI and no base_uri configured".to_string(),
        )),
        None => Err(TransportError::InvalidUrl(format!(
            "relative URI {:?} requires a base_uri",
            uri
        ))),
    }
}

/// The `query` option replaces any query string already on the URI
fn apply_query(url: &mut Url, query: Option<&OptionValue>) -> Result<(), TransportError> {
    match query {
        None | Some(OptionValue::Null) => {}
        Some(OptionValue::String(raw)) => url.set_query(Some(raw.trim_start_matches('?'))),
        Some(OptionValue::Map(params)) => {
            let pairs = flatten_pairs(params)?;
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        Some(other) => {
            return Err(TransportError::InvalidRequest(format!(
                "query must be a string or a map, got {:?}",
                other
            )))
        }
    }
    Ok(())
}

/// Flatten nested maps and lists into `key[sub]=value` pairs
fn flatten_pairs(params: &OptionMap) -> Result<Vec<(String, String)>, TransportError> {
    fn walk(
        key: String,
        value: &OptionValue,
        out: &mut Vec<(String, String)>,
    ) -> Result<(), TransportError> {
        match value {
            OptionValue::Null => {}
            OptionValue::Map(nested) => {
                for (sub, value) in nested {
                    walk(format!("{}[{}]", key, sub), value, out)?;
                }
            }
            OptionValue::List(items) => {
                for (index, value) in items.iter().enumerate() {
                    walk(format!("{}[{}]", key, index), value, out)?;
                }
            }
            OptionValue::Bool(b) => out.push((key, if *b { "1" } else { "0" }.to_string())),
            scalar => {
                let text = scalar.to_text().ok_or_else(|| {
                    TransportError::InvalidRequest(format!("{} cannot be encoded as a parameter", key))
                })?;
                out.push((key, text));
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    for (key, value) in params {
        walk(key.clone(), value, &mut out)?;
    }
    Ok(out)
}

fn apply_headers(
    mut builder: reqwest::RequestBuilder,
    headers: Option<&OptionValue>,
) -> Result<reqwest::RequestBuilder, TransportError> {
    let Some(headers) = headers else {
        return Ok(builder);
    };
    let headers = headers
        .as_map()
        .ok_or_else(|| TransportError::InvalidRequest("headers must be a map".to_string()))?;

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("Invalid header name {}: {}", name, e)))?;

        let values: Vec<&OptionValue> = match value {
            OptionValue::Null => Vec::new(),
            OptionValue::List(items) => items.iter().collect(),
            single => vec![single],
        };
        for value in values {
            let text = value.to_text().ok_or_else(|| {
                TransportError::InvalidRequest(format!("Header {} has a non-scalar value", name))
            })?;
            let header_value = HeaderValue::from_str(&text).map_err(|e| {
                TransportError::InvalidRequest(format!("Invalid value for header {}: {}", name, e))
            })?;
            builder = builder.header(header_name.clone(), header_value);
        }
    }

    Ok(builder)
}

fn apply_body(
    builder: reqwest::RequestBuilder,
    options: &OptionMap,
) -> Result<reqwest::RequestBuilder, TransportError> {
    let present: Vec<&str> = ["body", "json", "form_params", "multipart"]
        .into_iter()
        .filter(|key| matches!(options.get(*key), Some(value) if !value.is_null()))
        .collect();

    if present.len() > 1 {
        return Err(TransportError::InvalidRequest(format!(
            "Only one of body, json, form_params and multipart may be set, got {}",
            present.join(", ")
        )));
    }

    let Some(&kind) = present.first() else {
        return Ok(builder);
    };
    let value = &options[kind];

    Ok(match kind {
        "body" => match value {
            OptionValue::Bytes(bytes) => builder.body(bytes.clone()),
            other => builder.body(other.to_text().ok_or_else(|| {
                TransportError::InvalidRequest("body must be a string or bytes".to_string())
            })?),
        },
        "json" => {
            let json = value.to_json().ok_or_else(|| {
                TransportError::InvalidRequest("json option contains a non-serializable handle".to_string())
            })?;
            builder.json(&json)
        }
        "form_params" => {
            let params = value
                .as_map()
                .ok_or_else(|| TransportError::InvalidRequest("form_params must be a map".to_string()))?;
            builder.form(&flatten_pairs(params)?)
        }
        _ => builder.multipart(multipart_form(value)?),
    })
}

/// Build a multipart form from a list of `{name, contents, filename?, headers?}` parts
fn multipart_form(parts: &OptionValue) -> Result<reqwest::multipart::Form, TransportError> {
    let parts = parts
        .as_list()
        .ok_or_else(|| TransportError::InvalidRequest("multipart must be a list of parts".to_string()))?;

    let mut form = reqwest::multipart::Form::new();
    for (index, part) in parts.iter().enumerate() {
        let part = part.as_map().ok_or_else(|| {
            TransportError::InvalidRequest(format!("multipart part {} must be a map", index))
        })?;
        let name = part
            .get("name")
            .and_then(OptionValue::as_str)
            .ok_or_else(|| {
                TransportError::InvalidRequest(format!("multipart part {} requires a name", index))
            })?
            .to_string();
        let contents = match part.get("contents") {
            Some(OptionValue::Bytes(bytes)) => bytes.to_vec(),
            Some(value) => value
                .to_text()
                .ok_or_else(|| {
                    TransportError::InvalidRequest(format!("multipart part {} has invalid contents", name))
                })?
                .into_bytes(),
            None => {
                return Err(TransportError::InvalidRequest(format!(
                    "multipart part {} requires contents",
                    name
                )))
            }
        };

        let mut field = reqwest::multipart::Part::bytes(contents);
        if let Some(filename) = part.get("filename").and_then(OptionValue::as_str) {
            field = field.file_name(filename.to_string());
        }
        let content_type = part
            .get("headers")
            .and_then(OptionValue::as_map)
            .and_then(|headers| {
                headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case("content-type"))
                    .and_then(|(_, value)| value.as_str())
            });
        if let Some(content_type) = content_type {
            field = field.mime_str(content_type)?;
        }

        form = form.part(name, field);
    }

    Ok(form)
}

fn apply_auth(
    builder: reqwest::RequestBuilder,
    auth: Option<&OptionValue>,
) -> Result<reqwest::RequestBuilder, TransportError> {
    let parts = match auth {
        None | Some(OptionValue::Null) | Some(OptionValue::Bool(false)) => return Ok(builder),
        Some(OptionValue::List(parts)) => parts,
        Some(other) => {
            return Err(TransportError::InvalidRequest(format!(
                "auth must be a [username, password, type?] list, got {:?}",
                other
            )))
        }
    };

    let text = |index: usize| parts.get(index).and_then(OptionValue::to_text);
    let username = text(0)
        .ok_or_else(|| TransportError::InvalidRequest("auth requires a username".to_string()))?;
    let password = text(1);

    match text(2).as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("basic") => Ok(builder.basic_auth(username, password)),
        Some("bearer") => Ok(builder.bearer_auth(username)),
        Some(other) => Err(TransportError::InvalidRequest(format!(
            "Unsupported auth type: {}",
            other
        ))),
    }
}

fn parse_version(version: &OptionValue) -> Result<http::Version, TransportError> {
    let text = version.to_text().unwrap_or_default();
    match text.trim() {
        "1" | "1.0" => Ok(http::Version::HTTP_10),
        "1.1" => Ok(http::Version::HTTP_11),
        "2" | "2.0" => Ok(http::Version::HTTP_2),
        other => Err(TransportError::InvalidRequest(format!(
            "Unsupported protocol version: {}",
            other
        ))),
    }
}

async fn write_sink(sink: &OptionValue, body: &[u8]) -> Result<(), TransportError> {
    match sink {
        OptionValue::String(path) => tokio::fs::write(path, body)
            .await
            .map_err(|e| TransportError::Sink(format!("Cannot write {}: {}", path, e))),
        OptionValue::Handle(handle) => {
            let sink = handle.downcast_ref::<BodySink>().ok_or_else(|| {
                TransportError::Sink(format!("Unsupported sink handle: {}", handle.type_name()))
            })?;
            sink.write(body);
            Ok(())
        }
        OptionValue::Null => Ok(()),
        other => Err(TransportError::Sink(format!("Unsupported sink: {:?}", other))),
    }
}
