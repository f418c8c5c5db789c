//! Realtime database client over the REST streaming protocol
//!
//! Subscriptions hold a `text/event-stream` GET open on `<path>.json`. The
//! server sends `put` and `patch` events relative to the subscribed path;
//! the client keeps the subscribed subtree locally and pushes the full value
//! to the sink after every change. Writes are plain `PUT <path>.json`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::tree::{join, set_at};
use super::{DataStore, Scalar, SnapshotSink, SubscriptionHandle};
use crate::error::{HomeSyncError, Result};
use crate::io::HttpClient;

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub name: String,
    pub data: String,
}

/// Longest line the parser buffers; longer lines are dropped up to their newline
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Incremental `text/event-stream` parser; chunks may split lines anywhere
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    discarding: bool,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Feed a chunk and return every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.take_event() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            warn!(
                "Dropping stream line longer than {} bytes and its event",
                MAX_LINE_BYTES
            );
            self.buffer.clear();
            self.discarding = true;
            self.event = None;
            self.data.clear();
        }

        events
    }

    fn take_event(&mut self) -> Option<SseEvent> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        Some(SseEvent {
            name: self.event.take().unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

/// What an event did to the local tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEffect {
    Changed,
    Ignored,
    /// The server ended the stream (`cancel`, `auth_revoked`)
    Ended(String),
}

/// Apply one stream event to the locally mirrored subtree
pub fn apply_event(tree: &mut Value, event: &SseEvent) -> Result<EventEffect> {
    match event.name.as_str() {
        "put" => {
            let payload: StreamPayload = serde_json::from_str(&event.data)?;
            set_at(tree, &payload.path, payload.data);
            Ok(EventEffect::Changed)
        }
        "patch" => {
            let payload: StreamPayload = serde_json::from_str(&event.data)?;
            let Value::Object(children) = payload.data else {
                return Err(HomeSyncError::Store(format!(
                    "patch at {} is not an object",
                    payload.path
                )));
            };
            for (key, value) in children {
                set_at(tree, &join(&payload.path, &key), value);
            }
            Ok(EventEffect::Changed)
        }
        "keep-alive" => Ok(EventEffect::Ignored),
        "cancel" | "auth_revoked" => Ok(EventEffect::Ended(event.name.clone())),
        other => {
            debug!("Ignoring stream event '{}'", other);
            Ok(EventEffect::Ignored)
        }
    }
}

#[derive(Debug)]
enum StreamEnd {
    Closed,
    SinkClosed,
    Ended(String),
}

/// Datastore backed by a realtime database REST endpoint
pub struct RestStreamStore {
    base_url: String,
    reconnect_delay: Duration,
    http: Arc<dyn HttpClient>,
    next_id: AtomicU64,
    active: Arc<Mutex<HashMap<u64, CancellationToken>>>,
}

impl std::fmt::Debug for RestStreamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStreamStore")
            .field("base_url", &self.base_url)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish()
    }
}

impl RestStreamStore {
    pub fn new(base_url: &str, reconnect_delay: Duration, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        debug!("Created RestStreamStore at {}", base_url);
        Self {
            base_url,
            reconnect_delay,
            http,
            next_id: AtomicU64::new(0),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Streams that are still running
    pub async fn subscription_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// REST URL of a store path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl DataStore for RestStreamStore {
    async fn subscribe(&self, path: &str, sink: SnapshotSink) -> Result<SubscriptionHandle> {
        let handle = SubscriptionHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            path: path.to_string(),
        };
        let cancel = CancellationToken::new();
        self.active.lock().await.insert(handle.id, cancel.clone());

        let url = self.url_for(path);
        let http = Arc::clone(&self.http);
        let delay = self.reconnect_delay;
        let active = Arc::clone(&self.active);
        let id = handle.id;
        tokio::spawn(async move {
            stream_loop(url, http, sink, cancel, delay).await;
            active.lock().await.remove(&id);
        });

        debug!("Subscribed {}", handle);
        Ok(handle)
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        let cancel = self
            .active
            .lock()
            .await
            .remove(&handle.id)
            .ok_or_else(|| HomeSyncError::Store(format!("unknown subscription {}", handle)))?;
        cancel.cancel();
        debug!("Unsubscribed {}", handle);
        Ok(())
    }

    async fn write(&self, path: &str, value: Scalar) -> Result<()> {
        let url = self.url_for(path);
        let response = self.http.put_json(&url, &value.to_json()).await?;
        if !response.is_success() {
            return Err(HomeSyncError::Store(format!(
                "PUT {} -> {}: {}",
                url, response.status, response.body
            )));
        }
        Ok(())
    }
}

async fn stream_loop(
    url: String,
    http: Arc<dyn HttpClient>,
    sink: SnapshotSink,
    cancel: CancellationToken,
    reconnect_delay: Duration,
) {
    let mut tree = Value::Null;

    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            outcome = follow_stream(&url, http.as_ref(), &sink, &mut tree) => outcome,
        };

        match outcome {
            Ok(StreamEnd::SinkClosed) => {
                debug!("Sink for {} closed, stopping stream", url);
                return;
            }
            Ok(StreamEnd::Closed) => info!("Stream {} closed by server", url),
            Ok(StreamEnd::Ended(reason)) => warn!("Stream {} ended by server: {}", url, reason),
            Err(e) => warn!("Stream {} failed: {}", url, e),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(reconnect_delay) => {
                debug!("Reconnecting stream {}", url);
            }
        }
    }
}

async fn follow_stream(
    url: &str,
    http: &dyn HttpClient,
    sink: &SnapshotSink,
    tree: &mut Value,
) -> Result<StreamEnd> {
    let mut stream = http.open_event_stream(url).await?;
    let mut parser = SseParser::default();

    while let Some(chunk) = stream.next_chunk().await? {
        for event in parser.feed(&chunk) {
            match apply_event(tree, &event) {
                Ok(EventEffect::Changed) => {
                    if sink.send(tree.clone()).is_err() {
                        return Ok(StreamEnd::SinkClosed);
                    }
                }
                Ok(EventEffect::Ignored) => {}
                Ok(EventEffect::Ended(reason)) => return Ok(StreamEnd::Ended(reason)),
                Err(e) => warn!("Skipping malformed '{}' event on {}: {}", event.name, url, e),
            }
        }
    }

    Ok(StreamEnd::Closed)
}
