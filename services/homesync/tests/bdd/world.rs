//! BDD test world for homesync service

use std::fmt;
use std::sync::Arc;

use cucumber::World;
use homesync::alerts::AlertLabels;
use homesync::dispatcher::PendingWrite;
use homesync::state::SensorState;
use homesync::store::MemoryStore;
use homesync::SyncSession;

#[derive(Default, World)]
pub struct HomeSyncWorld {
    // Alert classification
    pub sensors: SensorState,
    pub labels: Option<AlertLabels>,

    // Session against the in-memory store
    pub store: Option<Arc<MemoryStore>>,
    pub session: Option<Arc<SyncSession>>,
    pub last_start: Option<homesync::Result<()>>,

    // Commands
    pub pending: Option<PendingWrite>,
    pub command_error: Option<homesync::HomeSyncError>,
    pub acknowledged: Option<bool>,

    // Dashboard
    pub response_status: Option<u16>,
    pub response_body: Option<serde_json::Value>,
}

impl fmt::Debug for HomeSyncWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeSyncWorld")
            .field("sensors", &self.sensors)
            .field("labels", &self.labels)
            .field("store", &self.store)
            .field("session", &self.session.is_some())
            .field("pending", &self.pending)
            .field("command_error", &self.command_error)
            .field("response_status", &self.response_status)
            .finish()
    }
}

impl HomeSyncWorld {
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(self.store.as_ref().expect("store not set"))
    }

    pub fn session(&self) -> Arc<SyncSession> {
        Arc::clone(self.session.as_ref().expect("session not set"))
    }
}
