use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::transport::{Query, Response, Transport};
use crate::types::Snapshot;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Call {
    pub fn api_key(&self) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == "api_key")
            .map(|(_, value)| value.as_str())
    }
}

/// Replays canned responses in order and records every request. Running
/// out of responses yields a 500.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<Response>>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub fn with_responses(responses: Vec<Response>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::default(),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(
        &self,
        method: &'static str,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Response, Error> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.into(),
            query: query.to_vec(),
            body: body.cloned(),
        });
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Response::new(500, r#"{"errors": ["no response queued"]}"#)))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, path: &str, query: &Query) -> Result<Response, Error> {
        self.record("GET", path, query, None)
    }

    async fn post(&self, path: &str, query: &Query, body: &Value) -> Result<Response, Error> {
        self.record("POST", path, query, Some(body))
    }

    async fn put(&self, path: &str, query: &Query, body: &Value) -> Result<Response, Error> {
        self.record("PUT", path, query, Some(body))
    }

    async fn delete(&self, path: &str, query: &Query) -> Result<Response, Error> {
        self.record("DELETE", path, query, None)
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a plain-text subscriber and returns what it logged.
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}

pub(crate) fn snapshot(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}
