//! HomeSync - realtime state synchronization for a home-automation dashboard
//!
//! Subscribes to the `devices` and `signals` path groups of a realtime
//! datastore, keeps a validated local copy of actuator and sensor state,
//! derives alert labels from the sensors and writes actuator commands back.

pub mod alerts;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod io;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod subscription;

pub use config::{load_config, Config};
pub use error::{HomeSyncError, Result};
pub use session::SyncSession;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::StoreConfig;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::store::{DataStore, MemoryStore, RestStreamStore};

/// Builder for a [`HomeSync`] service.
///
/// The store is created from the configuration unless one is injected.
pub struct HomeSyncBuilder {
    config: Config,
    store: Option<Arc<dyn DataStore>>,
    http: Option<Arc<dyn HttpClient>>,
    cancel: Option<CancellationToken>,
}

impl HomeSyncBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            http: None,
            cancel: None,
        }
    }

    /// Use this store instead of the configured one
    pub fn with_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// HTTP client for the REST store
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn build(self) -> Result<HomeSync> {
        let store = match self.store {
            Some(store) => store,
            None => build_store(&self.config.store, self.http)?,
        };
        info!("Using '{}' store", self.config.store.type_name());

        let session = Arc::new(SyncSession::new(store, self.config.paths.clone()));

        Ok(HomeSync {
            config: self.config,
            session,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

fn build_store(
    config: &StoreConfig,
    http: Option<Arc<dyn HttpClient>>,
) -> Result<Arc<dyn DataStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Rest {
            base_url,
            reconnect_delay,
        } => {
            if base_url.trim().is_empty() {
                return Err(HomeSyncError::Config(
                    "rest store requires a non-empty base_url".to_string(),
                ));
            }
            let http = http.unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
            Ok(Arc::new(RestStreamStore::new(
                base_url,
                *reconnect_delay,
                http,
            )))
        }
    }
}

/// A built service, ready to start
pub struct HomeSync {
    config: Config,
    session: Arc<SyncSession>,
    cancel: CancellationToken,
}

impl HomeSync {
    pub fn session(&self) -> Arc<SyncSession> {
        Arc::clone(&self.session)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start syncing and serve the dashboard until cancelled, then tear down
    pub async fn start(self) -> Result<()> {
        self.session.start().await?;

        if self.config.dashboard.enabled {
            let dashboard_port = self.config.dashboard.port;
            let session = Arc::clone(&self.session);
            let cancel_for_dashboard = self.cancel.clone();

            tokio::spawn(async move {
                let router = dashboard::build_router(session);
                let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
                info!("Dashboard listening on http://{}", addr);

                let listener = match tokio::net::TcpListener::bind(addr).await {
                    Ok(l) => l,
                    Err(e) => {
                        error!(
                            "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                            dashboard_port, e
                        );
                        return;
                    }
                };

                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        cancel_for_dashboard.cancelled().await;
                    })
                    .await
                    .ok();

                debug!("Dashboard stopped");
            });
        }

        info!("HomeSync started");
        self.cancel.cancelled().await;

        self.session.stop().await;
        info!("HomeSync stopped");
        Ok(())
    }
}

/// Run the service with the given configuration until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let homesync = HomeSyncBuilder::new(config).build().await?;

    let cancel = homesync.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel.cancel();
    });

    homesync.start().await
}
