//! Recognised request option names
//!
//! The list is fixed and versioned; bump [`OPTION_REGISTRY_VERSION`] whenever
//! an entry is added or removed.

/// Version of [`KNOWN_OPTIONS`]
pub const OPTION_REGISTRY_VERSION: u32 = 1;

/// Transport option names accepted by dynamic option-set calls
pub const KNOWN_OPTIONS: &[&str] = &[
    "allow_redirects",
    "auth",
    "body",
    "cert",
    "connect_timeout",
    "cookies",
    "debug",
    "decode_content",
    "delay",
    "expect",
    "force_ip_resolve",
    "form_params",
    "headers",
    "http_errors",
    "idn_conversion",
    "json",
    "multipart",
    "on_headers",
    "on_stats",
    "progress",
    "proxy",
    "query",
    "read_timeout",
    "sink",
    "ssl_key",
    "stream",
    "synchronous",
    "timeout",
    "verify",
    "version",
];

/// Options consumed by a single dispatch and then cleared from the store
pub const ONE_SHOT_OPTIONS: &[&str] = &[
    "body",
    "form_params",
    "multipart",
    "json",
    "query",
    "sink",
    "save_to",
    "headers.Content-Type",
];

/// Options that shape the underlying connection rather than one request
pub const CLIENT_LEVEL_OPTIONS: &[&str] = &[
    "allow_redirects",
    "connect_timeout",
    "cookies",
    "decode_content",
    "proxy",
    "verify",
];

/// Look up a registered option name, returning the registry's own
/// `'static` copy
pub fn lookup(name: &str) -> Option<&'static str> {
    KNOWN_OPTIONS.iter().copied().find(|known| *known == name)
}

pub fn is_known(name: &str) -> bool {
    lookup(name).is_some()
}
