//! Realtime datastore abstraction
//!
//! The sync core only needs three capabilities from the store: push-based
//! subscriptions delivering the full value at a path, scalar writes, and
//! unsubscribing.

pub mod memory;
pub mod rest;
pub mod tree;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

pub use memory::MemoryStore;
pub use rest::RestStreamStore;

/// Receives the full value at a subscribed path on attach and on every change.
/// `Value::Null` means there is no data at the path.
pub type SnapshotSink = mpsc::UnboundedSender<Value>;

/// Identifies one registered subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub id: u64,
    pub path: String,
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.id, self.path)
    }
}

/// An integer written to a leaf path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scalar(pub i64);

impl Scalar {
    pub fn to_json(self) -> Value {
        Value::from(self.0)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection to a realtime datastore, shared by all subscriptions and writes
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DataStore: Send + Sync {
    /// Register a persistent listener for `path`
    async fn subscribe(&self, path: &str, sink: SnapshotSink) -> crate::Result<SubscriptionHandle>;

    /// Remove a listener; no snapshot is delivered to its sink afterwards
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> crate::Result<()>;

    /// Write a scalar to a leaf path
    async fn write(&self, path: &str, value: Scalar) -> crate::Result<()>;
}
