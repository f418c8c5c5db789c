//! In-process datastore with subscriber fan-out

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::tree::{overlaps, set_at, value_at};
use super::{DataStore, Scalar, SnapshotSink, SubscriptionHandle};
use crate::error::{HomeSyncError, Result};

/// Number of recent writes kept for inspection
pub const WRITE_LOG_CAPACITY: usize = 64;

#[derive(Debug)]
struct Subscriber {
    handle: SubscriptionHandle,
    sink: SnapshotSink,
}

#[derive(Debug, Default)]
struct Inner {
    tree: Value,
    subscribers: Vec<Subscriber>,
    writes: VecDeque<(String, Scalar)>,
}

/// A datastore kept entirely in memory.
///
/// Every change is pushed to each subscription whose path overlaps the
/// changed path, carrying the full value at the subscription's own path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `tree`
    pub fn with_tree(tree: Value) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tree,
                ..Inner::default()
            }),
            ..Self::default()
        }
    }

    /// Replace the value at `path` as another client of the store would
    pub async fn put(&self, path: &str, value: Value) {
        let mut inner = self.inner.lock().await;
        set_at(&mut inner.tree, path, value);
        notify(&mut inner, path);
    }

    /// Current value at `path`
    pub async fn get(&self, path: &str) -> Value {
        value_at(&self.inner.lock().await.tree, path)
    }

    /// Make every following `write` fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }

    /// The most recent successful writes, oldest first
    pub async fn writes(&self) -> Vec<(String, Scalar)> {
        self.inner.lock().await.writes.iter().cloned().collect()
    }
}

fn notify(inner: &mut Inner, changed_path: &str) {
    let tree = &inner.tree;
    inner.subscribers.retain(|subscriber| {
        if !overlaps(&subscriber.handle.path, changed_path) {
            return true;
        }
        let snapshot = value_at(tree, &subscriber.handle.path);
        if subscriber.sink.send(snapshot).is_err() {
            debug!(
                "Dropping subscription {} with closed sink",
                subscriber.handle
            );
            return false;
        }
        true
    });
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn subscribe(&self, path: &str, sink: SnapshotSink) -> Result<SubscriptionHandle> {
        let handle = SubscriptionHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            path: path.to_string(),
        };

        let mut inner = self.inner.lock().await;
        sink.send(value_at(&inner.tree, path))
            .map_err(|_| HomeSyncError::Store(format!("sink for {} is closed", path)))?;
        inner.subscribers.push(Subscriber {
            handle: handle.clone(),
            sink,
        });

        debug!("Subscribed {}", handle);
        Ok(handle)
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.handle != *handle);
        if inner.subscribers.len() == before {
            return Err(HomeSyncError::Store(format!(
                "unknown subscription {}",
                handle
            )));
        }
        debug!("Unsubscribed {}", handle);
        Ok(())
    }

    async fn write(&self, path: &str, value: Scalar) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HomeSyncError::Store(format!("write to {} rejected", path)));
        }
        let mut inner = self.inner.lock().await;
        if inner.writes.len() == WRITE_LOG_CAPACITY {
            inner.writes.pop_front();
        }
        inner.writes.push_back((path.to_string(), value));
        set_at(&mut inner.tree, path, value.to_json());
        notify(&mut inner, path);
        Ok(())
    }
}
