//! Client configuration
//!
//! Clients are configured with an options map. This module provides:
//! - [`ClientConfig`], a typed builder that produces such a map
//! - [`ClientContext`], the defaults a client is constructed against
//! - the process-wide defaults used by [`HttpClient::new`](crate::HttpClient::new)

use crate::store::deep_merge;
use crate::value::{OptionMap, OptionValue};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::time::Duration;

/// Typed builder for the most common client options
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Base URI relative request URIs are resolved against
    pub base_uri: Option<String>,

    /// Total request timeout
    pub timeout: Option<Duration>,

    /// Connection timeout
    pub connect_timeout: Option<Duration>,

    /// Whether to follow redirects
    pub follow_redirects: Option<bool>,

    /// Maximum number of redirects to follow
    pub max_redirects: Option<usize>,

    /// User-Agent header value
    pub user_agent: Option<String>,

    /// Whether to verify TLS certificates
    pub verify: Option<bool>,

    /// Transparently decompress response bodies
    pub decode_content: Option<bool>,

    /// Keep a cookie store across requests
    pub cookies: Option<bool>,

    /// Proxy URL for all schemes
    pub proxy: Option<String>,

    /// Headers sent with every request
    pub headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URI
    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout from seconds; negative or out-of-range values clear it
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Duration::try_from_secs_f64(secs).ok();
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set whether to follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Set maximum redirects (implies following them)
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Accept invalid certificates when `false` (testing only)
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    /// Enable/disable response decompression
    pub fn decode_content(mut self, enabled: bool) -> Self {
        self.decode_content = Some(enabled);
        self
    }

    pub fn cookies(mut self, enabled: bool) -> Self {
        self.cookies = Some(enabled);
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Convert into the options map a client is constructed from.
    /// Unset fields are left out so defaults still apply.
    pub fn into_options(self) -> OptionMap {
        let mut options = OptionMap::new();

        if let Some(uri) = self.base_uri {
            options.insert("base_uri".into(), uri.into());
        }
        if let Some(timeout) = self.timeout {
            options.insert("timeout".into(), timeout.as_secs_f64().into());
        }
        if let Some(timeout) = self.connect_timeout {
            options.insert("connect_timeout".into(), timeout.as_secs_f64().into());
        }
        match (self.follow_redirects, self.max_redirects) {
            (Some(false), _) => {
                options.insert("allow_redirects".into(), false.into());
            }
            (_, Some(max)) => {
                let mut redirects = OptionMap::new();
                redirects.insert("max".into(), OptionValue::Int(max as i64));
                options.insert("allow_redirects".into(), redirects.into());
            }
            (Some(true), None) => {
                options.insert("allow_redirects".into(), true.into());
            }
            (None, None) => {}
        }
        if let Some(verify) = self.verify {
            options.insert("verify".into(), verify.into());
        }
        if let Some(decode) = self.decode_content {
            options.insert("decode_content".into(), decode.into());
        }
        if let Some(cookies) = self.cookies {
            options.insert("cookies".into(), cookies.into());
        }
        if let Some(proxy) = self.proxy {
            options.insert("proxy".into(), proxy.into());
        }

        let mut headers: OptionMap = self
            .headers
            .into_iter()
            .map(|(name, value)| (name, OptionValue::from(value)))
            .collect();
        if let Some(user_agent) = self.user_agent {
            headers.insert("User-Agent".into(), user_agent.into());
        }
        if !headers.is_empty() {
            options.insert("headers".into(), headers.into());
        }

        options
    }
}

impl From<ClientConfig> for OptionValue {
    fn from(config: ClientConfig) -> Self {
        OptionValue::Map(config.into_options())
    }
}

/// Read a seconds value (integer or fractional) as a `Duration`.
///
/// Negative, non-finite and non-numeric values yield `None`.
pub fn duration_from_secs(value: &OptionValue) -> Option<Duration> {
    let secs = value.as_f64()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Defaults every client starts from
pub fn builtin_defaults() -> OptionMap {
    let mut defaults = OptionMap::new();
    defaults.insert("connect_timeout".into(), OptionValue::Int(5));
    defaults.insert("timeout".into(), OptionValue::Int(25));
    defaults
}

static PROCESS_DEFAULTS: Lazy<RwLock<OptionMap>> = Lazy::new(|| RwLock::new(builtin_defaults()));

/// Current process-wide default options
pub fn default_options() -> OptionMap {
    PROCESS_DEFAULTS.read().clone()
}

/// Replace the process-wide default options.
///
/// Only clients constructed afterwards see the change.
pub fn set_default_options(options: OptionMap) {
    *PROCESS_DEFAULTS.write() = options;
}

/// Defaults injected into a client at construction
#[derive(Debug, Clone, PartialEq)]
pub struct ClientContext {
    defaults: OptionMap,
}

impl ClientContext {
    pub fn new(defaults: OptionMap) -> Self {
        Self { defaults }
    }

    /// Snapshot of the process-wide defaults
    pub fn global() -> Self {
        Self::new(default_options())
    }

    /// Context with no defaults at all
    pub fn empty() -> Self {
        Self::new(OptionMap::new())
    }

    pub fn defaults(&self) -> &OptionMap {
        &self.defaults
    }

    /// Deep-merge more defaults into this context
    pub fn with_defaults(mut self, overrides: OptionMap) -> Self {
        deep_merge(&mut self.defaults, overrides);
        self
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::new(builtin_defaults())
    }
}
