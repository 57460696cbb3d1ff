pub mod connection_manager;
pub mod executor;
pub mod mysql;
pub mod profile;
pub mod schema;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub use connection_manager::{ActiveConnection, ConnectionManager, ConnectionStatus};
pub use profile::ConnectionProfile;
pub use schema::{ColumnDescriptor, SchemaDescriptor, TableDescriptor};

/// One result row, keyed by column name in result order
pub type Record = Map<String, Value>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("{0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Column metadata reported alongside result rows
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Result header of a statement that returns no result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub affected_rows: u64,
    pub insert_id: u64,
}

/// Rows and field metadata exactly as the engine produced them.
///
/// `fields` describes the statement's result columns even when no row
/// matched. Statements without a result set (INSERT, UPDATE, DDL) carry
/// their `outcome` instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    pub fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WriteOutcome>,
}

/// A live database reachable through a connection pool.
#[async_trait]
pub trait Database: Send + Sync {
    async fn ping(&self) -> Result<(), DbError>;

    /// Tables of the currently selected database, in the engine's order
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    /// Columns of `table` with declared types, in the engine's order
    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DbError>;

    /// Runs `sql` unmodified
    async fn execute(&self, sql: &str) -> Result<QueryResult, DbError>;
}

/// Builds a pooled [`Database`] from a connection profile.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Arc<dyn Database>, DbError>;
}
