use crate::config::ProfileOverrides;
use crate::db::profile::ConnectRequest;
use crate::db::{ConnectionProfile, Connector, Database};
use crate::error::PipelineError;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// A pool that passed its connectivity check, tagged with the generation
/// that installed it.
pub struct ActiveConnection {
    generation: u64,
    profile: ConnectionProfile,
    connected_at: chrono::DateTime<chrono::Utc>,
    database: Arc<dyn Database>,
}

impl ActiveConnection {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    pub fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Owns the single process-wide database connection.
///
/// Reconnecting swaps the whole [`ActiveConnection`]. Callers hold an `Arc`
/// for the duration of an operation, so work already in flight finishes on
/// the pool it started with while new work sees the replacement.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    overrides: ProfileOverrides,
    active: RwLock<Option<Arc<ActiveConnection>>>,
    generation: AtomicU64,
}

impl ConnectionManager {
    pub fn new(connector: Box<dyn Connector>, overrides: ProfileOverrides) -> Self {
        Self {
            connector,
            overrides,
            active: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Opens a pool for `request` and installs it once `SELECT 1` succeeds.
    /// On failure the previous connection, if any, stays in place.
    pub async fn connect(&self, request: ConnectRequest) -> Result<Arc<ActiveConnection>, PipelineError> {
        let profile = ConnectionProfile::resolve(request, &self.overrides);
        info!(
            "Connecting to {}:{} database '{}' as '{}'",
            profile.host, profile.port, profile.database, profile.user
        );

        let database = self.connector.connect(&profile).await.map_err(|e| {
            error!("Connection failed: {}", e);
            PipelineError::Connection(e.to_string())
        })?;

        database.ping().await.map_err(|e| {
            error!("Connection check failed: {}", e);
            PipelineError::Connection(e.to_string())
        })?;

        // Generation is assigned under the write lock so the installed
        // connection always carries the highest number.
        let mut active = self.active.write().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let connection = Arc::new(ActiveConnection {
            generation,
            profile,
            connected_at: chrono::Utc::now(),
            database,
        });
        *active = Some(Arc::clone(&connection));
        drop(active);

        info!("Connection generation {} is now active", generation);
        Ok(connection)
    }

    /// The connection new operations should run against.
    pub async fn current(&self) -> Result<Arc<ActiveConnection>, PipelineError> {
        self.active
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(PipelineError::NotConnected)
    }

    pub async fn status(&self) -> ConnectionStatus {
        match self.active.read().await.as_ref() {
            Some(active) => ConnectionStatus {
                connected: true,
                generation: active.generation,
                host: Some(active.profile.host.clone()),
                database: Some(active.profile.database.clone()),
                connected_at: Some(active.connected_at),
            },
            None => ConnectionStatus {
                connected: false,
                generation: 0,
                host: None,
                database: None,
                connected_at: None,
            },
        }
    }
}
