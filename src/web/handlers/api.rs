use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::db::executor::QueryExecutor;
use crate::db::profile::ConnectRequest;
use crate::db::schema::SchemaIntrospector;
use crate::db::{ConnectionStatus, QueryResult};
use crate::error::{LlmStage, PipelineError};
use crate::insights::{Insight, InsightGenerator};
use crate::llm::extract::extract_sql;
use crate::llm::prompt::sql_prompt;
use crate::web::state::AppState;

// Request and response types

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub schema: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NlToSqlRequest {
    pub prompt: String,
    #[serde(default)]
    pub schema: String,
}

#[derive(Debug, Serialize)]
pub struct NlToSqlResponse {
    pub sql: String,
}

#[derive(Debug, Deserialize)]
pub struct RunQueryRequest {
    pub sql: String,
}

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
    pub rows: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub llm_backend: String,
    #[serde(flatten)]
    pub connection: ConnectionStatus,
}

fn invalid_body(rejection: JsonRejection) -> PipelineError {
    error!("Rejected request body: {}", rejection.body_text());
    PipelineError::InvalidRequest(rejection.body_text())
}

// API Implementations

pub async fn connect(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<ConnectResponse>, PipelineError> {
    // A malformed profile is a failed connect, reported in the connect shape
    let Json(payload) = payload.map_err(|rejection| PipelineError::Connection(rejection.body_text()))?;
    state.connections.connect(payload).await?;

    Ok(Json(ConnectResponse {
        success: true,
        message: "Connected successfully to MySQL!".to_string(),
    }))
}

pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaResponse>, PipelineError> {
    let schema = SchemaIntrospector::describe(&state.connections).await?;

    Ok(Json(SchemaResponse {
        schema: schema.to_string(),
    }))
}

// Natural language to SQL. The schema comes from the client so the model
// sees exactly what the user saw.
pub async fn nl_to_sql(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NlToSqlRequest>, JsonRejection>,
) -> Result<Json<NlToSqlResponse>, PipelineError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    debug!("NL-to-SQL request: {}", payload.prompt);

    let prompt = sql_prompt(&payload.prompt, &payload.schema);
    let raw = state.llm_manager.complete_sql(&prompt).await.map_err(|source| {
        error!("LLM error: {}", source);
        PipelineError::LlmInvocation {
            stage: LlmStage::SqlGeneration,
            source,
        }
    })?;

    let sql = extract_sql(raw.trim());
    if sql.is_empty() {
        info!("Model answer contained no recognizable SQL statement");
    } else {
        info!("Extracted SQL: {}", sql);
    }

    Ok(Json(NlToSqlResponse { sql }))
}

// Query execution. Model-generated SQL runs as-is with the stored credential.
pub async fn run_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RunQueryRequest>, JsonRejection>,
) -> Result<Json<QueryResult>, PipelineError> {
    // No connection outranks a bad body
    state.connections.current().await?;
    let Json(payload) = payload.map_err(invalid_body)?;

    let result = QueryExecutor::run(&state.connections, &payload.sql).await?;
    Ok(Json(result))
}

pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InsightsRequest>, JsonRejection>,
) -> Result<Json<InsightsResponse>, PipelineError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let rows = match payload.rows {
        Some(Value::Array(rows)) if !rows.is_empty() => rows,
        _ => return Err(PipelineError::EmptyInput),
    };

    let insights = InsightGenerator::generate(&state.llm_manager, &rows).await?;
    info!("Returning {} insights", insights.len());

    Ok(Json(InsightsResponse { insights }))
}

// System status
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        llm_backend: state.config.llm.backend.clone(),
        connection: state.connections.status().await,
    })
}
