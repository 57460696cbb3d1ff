//! Chart-ready insights derived from query results by the language model.
pub mod validator;

use crate::error::{LlmStage, PipelineError};
use crate::llm::prompt::insight_prompt;
use crate::llm::LlmManager;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{error, info};

pub use validator::{validate_insights, InsightBatch, InvalidInsight};

/// Any fence marker with its optional language tag: ```` ``` ````, ```` ```json ````
static FENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```[a-z]*").expect("fence pattern is valid"));

/// Chart kinds the insight prompt offers the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Bar,
    Pie,
    Doughnut,
    Line,
    Radar,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Bar,
        ChartType::Pie,
        ChartType::Doughnut,
        ChartType::Line,
        ChartType::Radar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Doughnut => "doughnut",
            ChartType::Line => "line",
            ChartType::Radar => "radar",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|chart| chart.as_str() == name)
    }
}

/// One validated insight. Fields the model added beyond the contract are
/// kept in `extra` and returned as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub label: String,
    pub chart_type: String,
    pub labels: Vec<Value>,
    pub values: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Insight {
    pub fn chart_kind(&self) -> Option<ChartType> {
        ChartType::parse(&self.chart_type)
    }
}

/// Removes markdown code fences from a model answer.
///
/// Only answers whose trimmed text starts with ```` ``` ```` are touched;
/// then every fence marker, with any language tag, is dropped and the rest
/// trimmed. Fences in the middle of prose are left alone.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    FENCE_MARKER.replace_all(trimmed, "").trim().to_string()
}

/// Parses a cleaned answer into insight candidates. Anything other than a
/// JSON array is a parse error carrying the text.
pub fn parse_candidates(cleaned: &str) -> Result<Vec<Value>, PipelineError> {
    let parsed: Value = serde_json::from_str(cleaned).map_err(|e| {
        error!("Failed to parse JSON: {}", e);
        PipelineError::InsightParse {
            raw: cleaned.to_string(),
            reason: e.to_string(),
        }
    })?;

    match parsed {
        Value::Array(candidates) => Ok(candidates),
        other => {
            error!("Expected a JSON array of insights, got: {}", other);
            Err(PipelineError::InsightParse {
                raw: cleaned.to_string(),
                reason: "expected a JSON array of insights".to_string(),
            })
        }
    }
}

/// Turns result rows into validated chart insights with one model call.
pub struct InsightGenerator;

impl InsightGenerator {
    pub async fn generate(llm: &LlmManager, rows: &[Value]) -> Result<Vec<Insight>, PipelineError> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let prompt = insight_prompt(rows);
        let raw = llm
            .complete_insights(&prompt)
            .await
            .map_err(|source| {
                error!("LLM Insights error: {}", source);
                PipelineError::LlmInvocation {
                    stage: LlmStage::InsightGeneration,
                    source,
                }
            })?;
        info!("LLM raw insight response: {}", raw);

        let cleaned = strip_code_fences(&raw);
        let candidates = parse_candidates(&cleaned)?;
        validate_insights(candidates).into_valid()
    }
}
