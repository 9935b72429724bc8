//! Transport capability
//!
//! The client never talks to the network itself. It hands the effective
//! options of each request to a [`Transport`], which owns connection
//! handling, TLS, pooling and redirects.

use crate::error::TransportError;
use crate::response::HttpResponse;
use crate::value::{Handle, OptionMap, OptionValue};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// HTTP engine performing the actual I/O
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Effective construction options after the transport filled in its own
    /// defaults. The client stores these as its persistent options.
    fn config(&self) -> OptionMap;

    /// Send one request
    async fn send(
        &self,
        method: http::Method,
        uri: &str,
        options: OptionMap,
    ) -> Result<HttpResponse, TransportError>;
}

/// A request sent through [`HttpClient::request_async`](crate::HttpClient::request_async).
///
/// Owns everything the request needs, so the client stays free for further
/// configuration while it is pending. Dropping it abandons the request.
#[must_use = "futures do nothing unless polled"]
pub struct PendingResponse {
    inner: BoxFuture<'static, Result<HttpResponse, TransportError>>,
}

impl PendingResponse {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        method: http::Method,
        uri: String,
        options: OptionMap,
    ) -> Self {
        Self {
            inner: Box::pin(async move { transport.send(method, &uri, options).await }),
        }
    }
}

impl Future for PendingResponse {
    type Output = Result<HttpResponse, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse").finish_non_exhaustive()
    }
}

/// In-memory destination for the `sink` option.
///
/// Clones share the same buffer, so keep one clone and hand the other to
/// [`HttpClient::save_to`](crate::HttpClient::save_to).
#[derive(Debug, Clone, Default)]
pub struct BodySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl BodySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffered contents with `body`
    pub fn write(&self, body: &[u8]) {
        let mut buffer = self.buffer.lock();
        buffer.clear();
        buffer.extend_from_slice(body);
    }

    pub fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buffer.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }
}

impl From<BodySink> for OptionValue {
    fn from(sink: BodySink) -> Self {
        OptionValue::Handle(Handle::new(sink))
    }
}
