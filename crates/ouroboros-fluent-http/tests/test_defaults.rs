//! Process-wide default options
//!
//! Kept in its own test binary since it mutates global state.

use ouroboros_fluent_http::{
    http_client, option_map, ClientConfig, ClientContext, HttpClient, OptionValue,
};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_default_options_apply_to_new_clients_only() {
    let original = HttpClient::default_options();
    assert_eq!(original, option_map(json!({"connect_timeout": 5, "timeout": 25})));

    let before = http_client("http://example.com").unwrap();

    let mut changed = original.clone();
    changed.insert("timeout".to_string(), OptionValue::Int(60));
    changed.insert("headers".to_string(), json!({"User-Agent": "defaults-test"}).into());
    HttpClient::set_default_options(changed);

    let after = HttpClient::new("http://example.com").unwrap();
    assert_eq!(after.option("timeout"), Some(&OptionValue::Int(60)));
    assert_eq!(
        after.option("headers.User-Agent"),
        Some(&OptionValue::from("defaults-test"))
    );
    assert_eq!(before.option("timeout"), Some(&OptionValue::Int(25)));
    assert!(before.option("headers.User-Agent").is_none());

    // An injected context ignores the process-wide defaults
    let isolated = HttpClient::with_context("http://example.com", &ClientContext::default()).unwrap();
    assert_eq!(isolated.option("timeout"), Some(&OptionValue::Int(25)));

    HttpClient::set_default_options(original.clone());
    assert_eq!(HttpClient::default_options(), original);
}

#[test]
fn test_typed_config_as_client_input() {
    let config = ClientConfig::new()
        .base_uri("http://example.com/api/")
        .timeout(Duration::from_secs(3))
        .max_redirects(2)
        .header("X-Client", "typed");

    let client = HttpClient::with_context(config, &ClientContext::empty()).unwrap();

    assert_eq!(client.option("base_uri"), Some(&OptionValue::from("http://example.com/api/")));
    assert_eq!(client.option("headers.X-Client"), Some(&OptionValue::from("typed")));
    assert_eq!(client.option("allow_redirects.max"), Some(&OptionValue::Int(2)));
    assert!(client.option("connect_timeout").is_none());
}
