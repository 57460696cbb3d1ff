//! Prompt templates for the two model calls.
//!
//! Inputs are embedded verbatim: nothing is escaped, truncated or screened.

use crate::insights::ChartType;
use serde_json::Value;

/// Builds the translation prompt: schema first, then the quoted request.
pub fn sql_prompt(request: &str, schema: &str) -> String {
    format!(
        "Given the following database schema:\n{}\n\nConvert the following user request into SQL:\n\"{}\"",
        schema, request
    )
}

/// Builds the insight prompt around the pretty-printed result rows.
///
/// The answer contract is a bare JSON array of
/// `{label, chartType, labels, values}` objects with no prose or fences.
pub fn insight_prompt(rows: &[Value]) -> String {
    let data = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());
    let chart_types = ChartType::ALL
        .iter()
        .map(|chart| format!("\"{}\"", chart.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Given this data:
{}

Your task is to suggest one or more useful insights (such as summaries, patterns, or comparisons) from the data that can be visualized.

For each insight, provide:
- "label": a short descriptive title (string)
- "chartType": one of [{}] (string)
- "labels": an array of strings (x-axis categories or groups)
- "values": an array of numbers (y-axis values corresponding to labels)

IMPORTANT INSTRUCTIONS:
- ONLY output a pure JSON array of objects
- DO NOT include any explanations, text, code comments, or code blocks
- The response must start with '[' and end with ']'

Example output:
[
  {{
    "label": "",
    "chartType": "bar",
    "labels": ["y", "y"],
    "values": [0, 100]
  }}
]"#,
        data, chart_types
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sql_prompt_embeds_schema_then_quoted_request() {
        let prompt = sql_prompt("total sales per month", "orders(id int, total decimal(10,2))");
        assert_eq!(
            prompt,
            "Given the following database schema:\norders(id int, total decimal(10,2))\n\n\
             Convert the following user request into SQL:\n\"total sales per month\""
        );
    }

    #[test]
    fn sql_prompt_does_not_escape_input() {
        let prompt = sql_prompt("say \"hi\"; DROP TABLE x", "");
        assert!(prompt.ends_with("\"say \"hi\"; DROP TABLE x\""));
    }

    #[test]
    fn insight_prompt_lists_contract_and_data() {
        let rows = vec![json!({"month": "Jan", "total": 120})];

        let prompt = insight_prompt(&rows);
        assert!(prompt.starts_with("Given this data:\n[\n  {\n    \"month\": \"Jan\""));
        assert!(prompt.contains(r#"one of ["bar", "pie", "doughnut", "line", "radar"]"#));
        assert!(prompt.contains("ONLY output a pure JSON array of objects"));
        assert!(prompt.ends_with("]"));
    }
}
