//! Command dispatcher: turns actuator intents into store writes

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::PathsConfig;
use crate::error::{HomeSyncError, Result};
use crate::snapshot::{Actuator, Switch};
use crate::state::StateHandle;
use crate::store::DataStore;

/// A write that has been issued but not necessarily acknowledged.
///
/// Dropping it does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    pub actuator: Actuator,
    pub value: Switch,
    pub path: String,
    completion: JoinHandle<bool>,
}

impl PendingWrite {
    /// Wait for the store's answer; true if the write succeeded
    pub async fn acknowledged(self) -> bool {
        self.completion.await.unwrap_or(false)
    }
}

/// Issues actuator writes without touching local state.
///
/// The new value shows up only once the devices subscription echoes it. Two
/// toggles issued before the echo arrives both read the same stale value and
/// write the same complement; that race is accepted.
pub struct CommandDispatcher {
    store: Arc<dyn DataStore>,
    state: StateHandle,
    paths: PathsConfig,
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn DataStore>, state: StateHandle, paths: PathsConfig) -> Self {
        Self {
            store,
            state,
            paths,
        }
    }

    /// Write the complement of the actuator's current value
    pub async fn toggle(&self, actuator: Actuator) -> Result<PendingWrite> {
        let current = {
            let state = self.state.read().await;
            if state.is_disposed() {
                return Err(HomeSyncError::SessionStopped);
            }
            state.actuator(actuator)
        };
        let target = current.toggled();
        debug!("Toggle '{}': {} -> {}", actuator, current, target);
        Ok(self.issue(actuator, target))
    }

    /// Write an explicit value; repeating it is harmless
    pub async fn set(&self, actuator: Actuator, value: Switch) -> Result<PendingWrite> {
        if self.state.read().await.is_disposed() {
            return Err(HomeSyncError::SessionStopped);
        }
        debug!("Set '{}' to {}", actuator, value);
        Ok(self.issue(actuator, value))
    }

    fn issue(&self, actuator: Actuator, value: Switch) -> PendingWrite {
        let path = self.paths.actuator_path(actuator);
        let store = Arc::clone(&self.store);
        let write_path = path.clone();

        let completion = tokio::spawn(async move {
            match store.write(&write_path, value.as_scalar()).await {
                Ok(()) => {
                    debug!("Write {} = {} accepted", write_path, value.as_u8());
                    true
                }
                Err(e) => {
                    warn!("Write {} = {} failed: {}", write_path, value.as_u8(), e);
                    false
                }
            }
        });

        PendingWrite {
            actuator,
            value,
            path,
            completion,
        }
    }
}
