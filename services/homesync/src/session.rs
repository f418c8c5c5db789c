//! Sync session: explicitly owned lifecycle around the synchronization core

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::PathsConfig;
use crate::dispatcher::{CommandDispatcher, PendingWrite};
use crate::error::{HomeSyncError, Result};
use crate::snapshot::{Actuator, PathGroup, Switch};
use crate::state::{new_state_handle, StateHandle, StateView};
use crate::store::DataStore;
use crate::subscription::SubscriptionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

/// One synchronization session against a store.
///
/// `start` opens the devices and signals subscriptions; `stop` tears them
/// down and disposes the state so nothing is applied afterwards. A stopped
/// session cannot be restarted.
pub struct SyncSession {
    state: StateHandle,
    manager: SubscriptionManager,
    dispatcher: CommandDispatcher,
    changes: watch::Receiver<StateView>,
    cancel: CancellationToken,
    lifecycle: Mutex<Lifecycle>,
}

impl SyncSession {
    pub fn new(store: Arc<dyn DataStore>, paths: PathsConfig) -> Self {
        let state = new_state_handle();
        let cancel = CancellationToken::new();
        let (changes_tx, changes) = watch::channel(StateView::default());

        let manager = SubscriptionManager::new(
            Arc::clone(&store),
            Arc::clone(&state),
            paths.clone(),
            changes_tx,
            cancel.clone(),
        );
        let dispatcher = CommandDispatcher::new(store, Arc::clone(&state), paths);

        Self {
            state,
            manager,
            dispatcher,
            changes,
            cancel,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Open both subscriptions
    pub async fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Running => return Err(HomeSyncError::AlreadyStarted),
            Lifecycle::Stopped => return Err(HomeSyncError::SessionStopped),
            Lifecycle::Idle => {}
        }

        if let Err(e) = self.manager.subscribe_all().await {
            self.manager.unsubscribe_all().await;
            return Err(e);
        }

        *lifecycle = Lifecycle::Running;
        info!("Sync session started");
        Ok(())
    }

    /// Unsubscribe, stop the apply tasks and dispose the state
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if *lifecycle == Lifecycle::Stopped {
            return;
        }

        self.manager.unsubscribe_all().await;
        self.cancel.cancel();
        self.state.write().await.dispose();

        *lifecycle = Lifecycle::Stopped;
        info!("Sync session stopped");
    }

    pub async fn is_running(&self) -> bool {
        *self.lifecycle.lock().await == Lifecycle::Running
    }

    pub async fn subscribed_groups(&self) -> Vec<PathGroup> {
        self.manager.active_groups().await
    }

    pub fn state(&self) -> StateHandle {
        Arc::clone(&self.state)
    }

    /// Receiver notified after every snapshot that changed a field
    pub fn changes(&self) -> watch::Receiver<StateView> {
        self.changes.clone()
    }

    /// Current state with freshly derived alert labels
    pub async fn view(&self) -> StateView {
        self.state.read().await.view()
    }

    pub async fn toggle(&self, actuator: Actuator) -> Result<PendingWrite> {
        self.dispatcher.toggle(actuator).await
    }

    pub async fn set(&self, actuator: Actuator, value: Switch) -> Result<PendingWrite> {
        self.dispatcher.set(actuator, value).await
    }
}
