//! ouroboros-fluent-http: Fluent request configuration and dispatch
//!
//! A configuration-and-dispatch layer in front of an HTTP transport. Request
//! options accumulate on the client through chained calls and are merged
//! with per-call overrides on every dispatch.
//!
//! # Architecture
//!
//! - `OptionValue` / `OptionStore`: nested options addressed by dotted paths
//! - `HttpClient`: persistent options, dispatch, last-response accessors and
//!   the name-routed `call` surface
//! - `Transport`: the HTTP engine; `ReqwestTransport` is the default
//! - `ClientConfig` / `ClientContext`: typed configuration and injected defaults

pub mod client;
pub mod config;
pub mod error;
pub mod method;
pub mod registry;
pub mod reqwest_transport;
pub mod response;
pub mod router;
pub mod store;
pub mod transport;
pub mod value;

pub use client::{http_client, HttpClient};
pub use config::{ClientConfig, ClientContext};
pub use error::{HttpError, HttpResult, TransportError, TransportErrorCategory};
pub use method::HttpMethod;
pub use reqwest_transport::ReqwestTransport;
pub use response::{HttpResponse, HttpResponseBuilder};
pub use router::{CallOutcome, RequestMode, ResponseField, Route};
pub use store::OptionStore;
pub use transport::{BodySink, PendingResponse, Transport};
pub use value::{option_map, Handle, OptionMap, OptionValue};
