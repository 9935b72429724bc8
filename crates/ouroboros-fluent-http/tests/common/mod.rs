//! In-memory transport that records every request it is asked to send

#![allow(dead_code)]

use async_trait::async_trait;
use ouroboros_fluent_http::{
    ClientContext, HttpClient, HttpResponse, HttpResponseBuilder, OptionMap, OptionValue, Transport,
    TransportError,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// A request as seen by the transport
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub method: http::Method,
    pub uri: String,
    pub options: OptionMap,
}

impl SentRequest {
    pub fn option(&self, path: &str) -> Option<&OptionValue> {
        ouroboros_fluent_http::store::get_path(&self.options, path)
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Respond(HttpResponse),
    Fail,
}

/// Shared view of a [`RecordingTransport`] kept by the test
#[derive(Clone)]
pub struct Recorder {
    sent: Arc<Mutex<Vec<SentRequest>>>,
    behavior: Arc<Mutex<Behavior>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            behavior: Arc::new(Mutex::new(Behavior::Respond(
                HttpResponseBuilder::new().status_code(200).body("ok").build(),
            ))),
        }
    }

    pub fn respond_with(&self, response: HttpResponse) {
        *self.behavior.lock() = Behavior::Respond(response);
    }

    pub fn fail(&self) {
        *self.behavior.lock() = Behavior::Fail;
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> SentRequest {
        self.sent.lock().last().cloned().expect("a request was sent")
    }

    /// A transport bound to this recorder that reports `config` back unchanged
    pub fn transport(&self, config: &OptionMap) -> RecordingTransport {
        RecordingTransport {
            recorder: self.clone(),
            config: config.clone(),
        }
    }
}

pub struct RecordingTransport {
    recorder: Recorder,
    config: OptionMap,
}

#[async_trait]
impl Transport for RecordingTransport {
    fn config(&self) -> OptionMap {
        self.config.clone()
    }

    async fn send(
        &self,
        method: http::Method,
        uri: &str,
        options: OptionMap,
    ) -> Result<HttpResponse, TransportError> {
        self.recorder.sent.lock().push(SentRequest {
            method,
            uri: uri.to_string(),
            options,
        });

        let behavior = self.recorder.behavior.lock().clone();
        match behavior {
            Behavior::Respond(response) => Ok(response),
            Behavior::Fail => Err(TransportError::Connection("connection refused".to_string())),
        }
    }
}

/// Client over a recording transport with the builtin defaults
pub fn recording_client(input: impl Into<OptionValue>) -> (HttpClient, Recorder) {
    let recorder = Recorder::new();
    let bound = recorder.clone();
    let client = HttpClient::with_transport(input, &ClientContext::default(), move |options| {
        Ok(bound.transport(options))
    })
    .expect("client builds");
    (client, recorder)
}
