use crate::config::AppConfig;
use crate::db::mysql::MySqlConnector;
use crate::db::{ConnectionManager, Connector};
use crate::llm::LlmManager;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    /// The single process-wide database connection
    pub connections: ConnectionManager,
    pub llm_manager: LlmManager,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// State backed by MySQL pools sized from the configuration
    pub fn new(config: AppConfig, llm_manager: LlmManager) -> Self {
        let connector = MySqlConnector::new(config.database.pool_size);
        Self::with_connector(config, Box::new(connector), llm_manager)
    }

    pub fn with_connector(
        config: AppConfig,
        connector: Box<dyn Connector>,
        llm_manager: LlmManager,
    ) -> Self {
        let connections = ConnectionManager::new(connector, config.database.overrides.clone());

        Self {
            config,
            connections,
            llm_manager,
            startup_time: chrono::Utc::now(),
        }
    }
}
