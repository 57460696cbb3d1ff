//! Failures of the request pipeline and how they render at the HTTP boundary
use crate::llm::LlmError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Which model call failed; the client-facing message differs per stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmStage {
    SqlGeneration,
    InsightGeneration,
}

impl LlmStage {
    fn message(self) -> &'static str {
        match self {
            LlmStage::SqlGeneration => "Failed to get SQL from LLM",
            LlmStage::InsightGeneration => "Failed to generate insights",
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Not connected to DB")]
    NotConnected,

    #[error("Failed to fetch schema: {0}")]
    Introspection(String),

    #[error("SQL execution failed: {0}")]
    QueryExecution(String),

    #[error("{}: {source}", .stage.message())]
    LlmInvocation {
        stage: LlmStage,
        #[source]
        source: LlmError,
    },

    #[error("No data provided for insights")]
    EmptyInput,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// Carries the cleaned model answer so callers can see what drifted
    #[error("Invalid JSON returned from LLM: {reason}")]
    InsightParse { raw: String, reason: String },

    #[error("No valid insights in LLM response")]
    NoValidInsights,
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Connection(_)
            | PipelineError::NotConnected
            | PipelineError::EmptyInput
            | PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            PipelineError::Connection(details) => json!({
                "success": false,
                "message": "Failed to connect to database",
                "error": details,
            }),
            PipelineError::NotConnected | PipelineError::EmptyInput => json!({
                "error": self.to_string(),
            }),
            PipelineError::InvalidRequest(details) => json!({
                "error": "Invalid request body",
                "details": details,
            }),
            PipelineError::Introspection(details) => json!({
                "error": "Failed to fetch schema",
                "details": details,
            }),
            PipelineError::QueryExecution(details) => json!({
                "error": "SQL execution failed",
                "details": details,
            }),
            PipelineError::LlmInvocation { stage, source } => json!({
                "error": stage.message(),
                "details": source.to_string(),
            }),
            PipelineError::InsightParse { raw, reason } => json!({
                "error": "Invalid JSON returned from LLM",
                "rawResponse": raw,
                "details": reason,
            }),
            PipelineError::NoValidInsights => json!({
                "error": "Failed to generate insights",
                "details": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
