//! MySQL implementation of the database seam
use crate::db::{
    ColumnDescriptor, ConnectionProfile, Connector, Database, DbError, FieldInfo, QueryResult, Record,
    WriteOutcome,
};
use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::types::{Decimal, Json};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens sqlx MySQL pools capped at `pool_size` physical connections.
pub struct MySqlConnector {
    pool_size: u32,
}

impl MySqlConnector {
    pub fn new(pool_size: u32) -> Self {
        Self { pool_size }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, profile: &ConnectionProfile) -> Result<Arc<dyn Database>, DbError> {
        let mut options = MySqlConnectOptions::new()
            .host(&profile.host)
            .port(profile.port)
            .username(&profile.user)
            .password(&profile.password);

        if !profile.database.is_empty() {
            options = options.database(&profile.database);
        }

        debug!("[MySqlConnector] Opening pool with {} connections", self.pool_size);
        let pool = MySqlPoolOptions::new()
            .max_connections(self.pool_size)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        Ok(Arc::new(MySqlDatabase { pool }))
    }
}

pub struct MySqlDatabase {
    pool: MySqlPool,
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query("SHOW TABLES").fetch_all(&self.pool).await?;
        let tables = rows
            .iter()
            .map(|row| text_at(row, 0))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("[MySqlDatabase::list_tables] Found {} tables", tables.len());
        Ok(tables)
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DbError> {
        let query = format!("SHOW COLUMNS FROM `{}`", table.replace('`', "``"));
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnDescriptor {
                    name: text_named(row, "Field", 0)?,
                    declared_type: text_named(row, "Type", 1)?,
                })
            })
            .collect()
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult, DbError> {
        // Preparing first reports the result columns even when no row
        // matches, and tells row-returning statements from writes.
        let described = (&self.pool).describe(sql).await?;
        let fields: Vec<FieldInfo> = described.columns().iter().map(field_info).collect();

        // Model-written statements are one-offs, keep them out of the statement cache
        if fields.is_empty() {
            let done = sqlx::query(sql).persistent(false).execute(&self.pool).await?;
            debug!("[MySqlDatabase::execute] Statement affected {} rows", done.rows_affected());
            return Ok(QueryResult {
                rows: Vec::new(),
                fields,
                outcome: Some(WriteOutcome {
                    affected_rows: done.rows_affected(),
                    insert_id: done.last_insert_id(),
                }),
            });
        }

        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;

        let records: Vec<Record> = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| (column.name().to_string(), json_value_at(row, column.ordinal())))
                    .collect()
            })
            .collect();

        debug!("[MySqlDatabase::execute] Query returned {} rows", records.len());
        Ok(QueryResult {
            rows: records,
            fields,
            outcome: None,
        })
    }
}

fn field_info(column: &MySqlColumn) -> FieldInfo {
    FieldInfo {
        name: column.name().to_string(),
        column_type: column.type_info().name().to_string(),
    }
}

/// Metadata statements return text columns, but some server versions send
/// them as binary strings.
fn metadata_text(
    column: &str,
    text: Result<String, sqlx::Error>,
    bytes: impl FnOnce() -> Result<Vec<u8>, sqlx::Error>,
) -> Result<String, DbError> {
    if let Ok(text) = text {
        return Ok(text);
    }
    bytes()
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .map_err(|e| DbError::QueryError(format!("Unreadable metadata column {}: {}", column, e)))
}

fn text_at(row: &MySqlRow, index: usize) -> Result<String, DbError> {
    metadata_text(&index.to_string(), row.try_get::<String, _>(index), || {
        row.try_get::<Vec<u8>, _>(index)
    })
}

fn text_named(row: &MySqlRow, name: &str, fallback_index: usize) -> Result<String, DbError> {
    metadata_text(name, row.try_get::<String, _>(name), || row.try_get::<Vec<u8>, _>(name))
        .or_else(|_| text_at(row, fallback_index))
}

/// Converts one MySQL value into JSON. DECIMAL and temporal values become
/// strings so no precision is lost.
fn json_value_at(row: &MySqlRow, index: usize) -> Value {
    let column = row.column(index);
    let type_name = column.type_info().name();

    if let Ok(value_ref) = row.try_get_raw(index) {
        if value_ref.is_null() {
            return Value::Null;
        }
    }

    if type_name == "JSON" {
        if let Ok(Json(value)) = row.try_get::<Json<Value>, _>(index) {
            return value;
        }
    }

    if let Ok(val) = row.try_get::<i64, _>(index) {
        return Value::from(val);
    }
    if let Ok(val) = row.try_get::<u64, _>(index) {
        return Value::from(val);
    }
    if let Ok(val) = row.try_get::<f64, _>(index) {
        return float_value(val);
    }
    if let Ok(val) = row.try_get::<f32, _>(index) {
        return float_value(f64::from(val));
    }
    if let Ok(val) = row.try_get::<Decimal, _>(index) {
        return Value::String(val.to_string());
    }
    if let Ok(val) = row.try_get::<String, _>(index) {
        return Value::String(val);
    }
    if let Ok(val) = row.try_get::<chrono::NaiveDateTime, _>(index) {
        return Value::String(val.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(val) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(index) {
        return Value::String(val.to_rfc3339());
    }
    if let Ok(val) = row.try_get::<chrono::NaiveDate, _>(index) {
        return Value::String(val.format("%Y-%m-%d").to_string());
    }
    if let Ok(val) = row.try_get::<chrono::NaiveTime, _>(index) {
        return Value::String(val.format("%H:%M:%S").to_string());
    }
    if let Ok(bytes) = row.try_get::<Vec<u8>, _>(index) {
        return Value::String(String::from_utf8_lossy(&bytes).to_string());
    }

    warn!("No JSON conversion for MySQL type {} in column {}", type_name, column.name());
    Value::Null
}

fn float_value(val: f64) -> Value {
    Number::from_f64(val).map(Value::Number).unwrap_or(Value::Null)
}
