//! Subscription manager: listens to the path groups and feeds the reducer

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::PathsConfig;
use crate::error::Result;
use crate::snapshot::{extract, FieldCheck, PathGroup, Rejection};
use crate::state::{ApplyOutcome, StateHandle, StateView};
use crate::store::{DataStore, SubscriptionHandle};

struct ActiveSubscription {
    group: PathGroup,
    handle: SubscriptionHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns one store subscription per path group and the tasks applying their
/// snapshots. Snapshots of one group are applied in delivery order; the two
/// groups interleave freely.
pub struct SubscriptionManager {
    store: Arc<dyn DataStore>,
    state: StateHandle,
    paths: PathsConfig,
    changes: watch::Sender<StateView>,
    cancel: CancellationToken,
    active: Mutex<Vec<ActiveSubscription>>,
}

impl SubscriptionManager {
    pub fn new(
        store: Arc<dyn DataStore>,
        state: StateHandle,
        paths: PathsConfig,
        changes: watch::Sender<StateView>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            state,
            paths,
            changes,
            cancel,
            active: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener for one path group
    pub async fn subscribe(&self, group: PathGroup) -> Result<()> {
        let path = self.paths.group_path(group).to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        debug!("Subscribing to '{}' at {}", group, path);
        let handle = self.store.subscribe(&path, tx).await?;

        let cancel = self.cancel.child_token();
        let task = tokio::spawn(apply_loop(
            group,
            rx,
            Arc::clone(&self.state),
            self.changes.clone(),
            cancel.clone(),
        ));

        self.active.lock().await.push(ActiveSubscription {
            group,
            handle,
            cancel,
            task,
        });
        info!("Subscribed to '{}' at {}", group, path);
        Ok(())
    }

    /// Register listeners for both path groups
    pub async fn subscribe_all(&self) -> Result<()> {
        for group in PathGroup::ALL {
            self.subscribe(group).await?;
        }
        Ok(())
    }

    /// Unregister every listener and wait for its apply task to finish
    pub async fn unsubscribe_all(&self) {
        let subscriptions = std::mem::take(&mut *self.active.lock().await);

        for subscription in subscriptions {
            if let Err(e) = self.store.unsubscribe(&subscription.handle).await {
                warn!(
                    "Failed to unsubscribe '{}' ({}): {}",
                    subscription.group, subscription.handle, e
                );
            }
            subscription.cancel.cancel();
            if let Err(e) = subscription.task.await {
                warn!("Apply task for '{}' ended abnormally: {}", subscription.group, e);
            }
            debug!("Unsubscribed from '{}'", subscription.group);
        }
    }

    /// Groups with a live subscription
    pub async fn active_groups(&self) -> Vec<PathGroup> {
        self.active.lock().await.iter().map(|s| s.group).collect()
    }
}

async fn apply_loop(
    group: PathGroup,
    mut snapshots: mpsc::UnboundedReceiver<Value>,
    state: StateHandle,
    changes: watch::Sender<StateView>,
    cancel: CancellationToken,
) {
    loop {
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Apply loop for '{}' cancelled", group);
                break;
            }
            raw = snapshots.recv() => match raw {
                Some(raw) => raw,
                None => {
                    debug!("Snapshot stream for '{}' closed", group);
                    break;
                }
            },
        };

        apply_snapshot(group, &raw, &state, &changes).await;
    }
}

/// Validate a raw snapshot and merge its accepted fields into the state.
///
/// Returns the number of fields whose value changed. When anything changed,
/// the new view is published while the state lock is still held so views
/// are observed in the order they were produced.
pub async fn apply_snapshot(
    group: PathGroup,
    raw: &Value,
    state: &StateHandle,
    changes: &watch::Sender<StateView>,
) -> usize {
    let checks = extract(group, raw);
    if checks.is_empty() {
        debug!("Empty '{}' snapshot, nothing to apply", group);
        return 0;
    }

    let now_ms = current_epoch_ms();
    let mut state = state.write().await;
    let mut changed = 0;

    for check in checks {
        match check {
            FieldCheck::Accepted(update) => match state.apply_update(update, now_ms) {
                ApplyOutcome::Changed => changed += 1,
                ApplyOutcome::Unchanged => {}
                ApplyOutcome::Disposed => {
                    debug!("State disposed, dropping '{}' snapshot", group);
                    return 0;
                }
            },
            FieldCheck::Rejected {
                key,
                reason: reason @ Rejection::OutOfRange(_),
            } => {
                debug!("Ignoring {}.{}: {}", group, key, reason);
            }
            FieldCheck::Rejected { key, reason } => {
                trace!("Skipping {}.{}: {}", group, key, reason);
            }
        }
    }

    debug!("Applied '{}' snapshot ({} changed)", group, changed);

    if changed > 0 {
        publish(changes, state.view());
    }
    changed
}

fn publish(changes: &watch::Sender<StateView>, view: StateView) {
    let previous = changes.borrow().alerts;
    if view.alerts != previous {
        for label in view.alerts.raised_since(&previous) {
            warn!("Alert raised: {}", label);
        }
        debug!("Alerts changed: {:?} -> {:?}", previous, view.alerts);
    }
    changes.send_replace(view);
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
