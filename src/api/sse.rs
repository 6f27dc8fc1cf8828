//! Server-Sent-Events transport for the progress stream.
//!
//! The backend pushes one JSON object per SSE frame on
//! `GET /sse/progress/{taskId}`. The decoder here is incremental: network
//! chunks do not align with frame boundaries, so bytes are buffered and
//! complete `data:` payloads are emitted as they dispatch on a blank line.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use log::debug;

use super::models::{ProgressEvent, TaskId};

/// Transport-level stream failures. `Parse` covers malformed payloads,
/// which the stream client treats like any other connection error.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connection lost: {0}")]
    Connection(String),
    #[error("malformed event payload: {0}")]
    Parse(String),
}

pub type EventStream =
    Pin<Box<dyn Stream<Item = Result<ProgressEvent, TransportError>> + Send>>;

/// Seam between the progress stream client and the wire. The production
/// implementation speaks SSE over HTTP; tests script events directly.
#[async_trait]
pub trait ProgressTransport: Send + Sync {
    async fn connect(&self, task: &TaskId) -> Result<EventStream, TransportError>;
}

/// Incremental SSE frame decoder. Collects `data:` lines and yields the
/// joined payload when the frame's terminating blank line arrives.
/// Comments and non-data fields (`event:`, `id:`, `retry:`) are ignored.
#[derive(Default)]
pub struct SseFrameDecoder {
    buf: String,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk; returns any complete frame payloads.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let raw: String = self.buf.drain(..=pos).collect();
            let line = raw.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            } else if line.starts_with(':') {
                // keep-alive comment
            }
        }
        payloads
    }
}

fn parse_event(payload: &str) -> Result<ProgressEvent, TransportError> {
    serde_json::from_str(payload).map_err(|e| TransportError::Parse(e.to_string()))
}

/// SSE over HTTP against the backend's progress endpoint.
pub struct HttpProgressTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProgressTransport {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl ProgressTransport for HttpProgressTransport {
    async fn connect(&self, task: &TaskId) -> Result<EventStream, TransportError> {
        let url = format!("{}/sse/progress/{}", self.base_url, task);
        debug!("opening progress stream: {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Connect(format!(
                "stream endpoint returned {status}"
            )));
        }

        let mut decoder = SseFrameDecoder::new();
        let events = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => Ok(decoder.push(&bytes)),
                Err(e) => Err(TransportError::Connection(e.to_string())),
            })
            .flat_map(|item| {
                let out: Vec<Result<ProgressEvent, TransportError>> = match item {
                    Ok(payloads) => payloads.iter().map(|p| parse_event(p)).collect(),
                    Err(e) => vec![Err(e)],
                };
                stream::iter(out)
            });

        Ok(Box::pin(events))
    }
}
