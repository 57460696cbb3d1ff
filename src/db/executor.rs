use crate::db::{ConnectionManager, QueryResult};
use crate::error::PipelineError;
use std::time::Instant;
use tracing::{error, info};

/// Runs extracted SQL against the active connection.
///
/// The text goes to the engine untouched: no statement allow-list, no
/// transaction, no row limit, and it runs with the stored credential's
/// privileges. An empty statement is left for the engine to reject.
pub struct QueryExecutor;

impl QueryExecutor {
    pub async fn run(connections: &ConnectionManager, sql: &str) -> Result<QueryResult, PipelineError> {
        let active = connections.current().await?;
        let start_time = Instant::now();
        info!("Executing SQL on connection generation {}: {}", active.generation(), sql);

        let result = active.database().execute(sql).await.map_err(|e| {
            error!("SQL execution error: {}", e);
            PipelineError::QueryExecution(e.to_string())
        })?;

        info!(
            "Query executed successfully. Row count: {}, Execution time: {}ms",
            result.rows.len(),
            start_time.elapsed().as_millis()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileOverrides;
    use crate::db::profile::ConnectRequest;
    use crate::db::{ColumnDescriptor, ConnectionProfile, Connector, Database, DbError, Record};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    /// Accepts exactly one canned statement and rejects the rest like an engine would.
    struct CannedEngine;

    #[async_trait]
    impl Database for CannedEngine {
        async fn ping(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn list_tables(&self) -> Result<Vec<String>, DbError> {
            Ok(vec![])
        }

        async fn list_columns(&self, _table: &str) -> Result<Vec<ColumnDescriptor>, DbError> {
            Ok(vec![])
        }

        async fn execute(&self, sql: &str) -> Result<QueryResult, DbError> {
            match sql {
                "" => Err(DbError::QueryError("1065 (42000): Query was empty".into())),
                "SELECT * FROM orders;" => {
                    let mut row = Record::new();
                    row.insert("id".into(), json!(1));
                    Ok(QueryResult {
                        rows: vec![row],
                        fields: vec![],
                        outcome: None,
                    })
                }
                _ => Err(DbError::QueryError("1064 (42000): You have an error in your SQL syntax".into())),
            }
        }
    }

    struct CannedConnector;

    #[async_trait]
    impl Connector for CannedConnector {
        async fn connect(&self, _profile: &ConnectionProfile) -> Result<Arc<dyn Database>, DbError> {
            Ok(Arc::new(CannedEngine))
        }
    }

    async fn connected() -> ConnectionManager {
        let manager = ConnectionManager::new(Box::new(CannedConnector), ProfileOverrides::default());
        manager.connect(ConnectRequest::default()).await.unwrap();
        manager
    }

    #[tokio::test]
    async fn returns_rows_unmodified() {
        let manager = connected().await;
        let result = QueryExecutor::run(&manager, "SELECT * FROM orders;").await.unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn empty_statement_surfaces_engine_error() {
        let manager = connected().await;
        let err = QueryExecutor::run(&manager, "").await.unwrap_err();
        match err {
            PipelineError::QueryExecution(details) => assert!(details.contains("Query was empty")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn requires_a_connection() {
        let manager = ConnectionManager::new(Box::new(CannedConnector), ProfileOverrides::default());
        let err = QueryExecutor::run(&manager, "SELECT 1").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotConnected));
    }
}
