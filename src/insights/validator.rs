use crate::error::PipelineError;
use crate::insights::Insight;
use serde_json::Value;
use tracing::{debug, warn};

/// A rejected candidate and its position in the model's array
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidInsight {
    pub index: usize,
    pub candidate: Value,
}

/// Candidates split by structural validity. Order is preserved in both halves.
#[derive(Debug, Default)]
pub struct InsightBatch {
    pub valid: Vec<Insight>,
    pub invalid: Vec<InvalidInsight>,
}

impl InsightBatch {
    /// Logs the rejected candidates and returns the valid ones, failing
    /// when none survived.
    pub fn into_valid(self) -> Result<Vec<Insight>, PipelineError> {
        if !self.invalid.is_empty() {
            warn!("Skipped {} invalid insights", self.invalid.len());
            for rejected in &self.invalid {
                warn!("Invalid insight at index {}: {}", rejected.index, rejected.candidate);
            }
        }

        if self.valid.is_empty() {
            return Err(PipelineError::NoValidInsights);
        }
        Ok(self.valid)
    }
}

/// Structural check: `label` and `chartType` are strings, `labels` and
/// `values` are arrays of the same length. Element types are not checked.
fn is_well_formed(candidate: &Value) -> bool {
    let labels = candidate.get("labels").and_then(Value::as_array);
    let values = candidate.get("values").and_then(Value::as_array);

    candidate.get("label").is_some_and(Value::is_string)
        && candidate.get("chartType").is_some_and(Value::is_string)
        && match (labels, values) {
            (Some(labels), Some(values)) => labels.len() == values.len(),
            _ => false,
        }
}

pub fn validate_insights(candidates: Vec<Value>) -> InsightBatch {
    let mut batch = InsightBatch::default();

    for (index, candidate) in candidates.into_iter().enumerate() {
        if !is_well_formed(&candidate) {
            batch.invalid.push(InvalidInsight { index, candidate });
            continue;
        }

        match serde_json::from_value::<Insight>(candidate.clone()) {
            Ok(insight) => {
                if insight.chart_kind().is_none() {
                    warn!("Insight {} uses unlisted chart type '{}'", index, insight.chart_type);
                }
                batch.valid.push(insight);
            }
            Err(e) => {
                debug!("Insight {} failed to deserialize: {}", index, e);
                batch.invalid.push(InvalidInsight { index, candidate });
            }
        }
    }

    batch
}
