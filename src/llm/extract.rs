//! Isolates a single SQL statement from a model's free-form answer.
//!
//! Scanning is line based with two states. While seeking, a line whose
//! trimmed, upper-cased text starts with a statement keyword switches to
//! capturing. While capturing, every line is kept verbatim and the first
//! line whose trimmed text ends with `;` ends the scan. A statement whose
//! keyword is not at the start of its first line (for example behind a
//! comment) is not found, and only the first statement is ever returned.

use tracing::debug;

pub const STATEMENT_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "CREATE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Seeking,
    Capturing,
}

fn starts_statement(trimmed: &str) -> bool {
    let upper = trimmed.to_uppercase();
    STATEMENT_KEYWORDS.iter().any(|kw| upper.starts_with(kw))
}

/// Returns the first statement found in `text`, trimmed.
///
/// The result is empty when no line starts with a keyword, and lacks a
/// trailing `;` when the input ends before a terminator.
pub fn extract_sql(text: &str) -> String {
    let mut state = ScanState::Seeking;
    let mut buffer = String::new();

    for line in text.split('\n') {
        let trimmed = line.trim();

        if state == ScanState::Seeking && starts_statement(trimmed) {
            state = ScanState::Capturing;
        }

        if state == ScanState::Capturing {
            buffer.push_str(line);
            buffer.push('\n');
            if trimmed.ends_with(';') {
                break;
            }
        }
    }

    let sql = buffer.trim().to_string();
    debug!("Extracted SQL: {}", sql);
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_conversational_filler() {
        let raw = "Sure! Here:\nSELECT * FROM orders;\nHope that helps!";
        assert_eq!(extract_sql(raw), "SELECT * FROM orders;");
    }

    #[test]
    fn no_keyword_yields_empty() {
        assert_eq!(extract_sql("I cannot answer that question."), "");
        assert_eq!(extract_sql(""), "");
    }

    #[test]
    fn unterminated_statement_is_returned_without_semicolon() {
        let raw = "Here you go:\nSELECT name\nFROM customers\n";
        assert_eq!(extract_sql(raw), "SELECT name\nFROM customers");
    }

    #[test]
    fn keeps_multi_line_statement_with_original_indentation() {
        let raw = "```sql\nWITH totals AS (\n    SELECT customer_id, SUM(total) AS spent\n    FROM orders GROUP BY customer_id\n)\nSELECT * FROM totals;\n```";
        assert_eq!(
            extract_sql(raw),
            "WITH totals AS (\n    SELECT customer_id, SUM(total) AS spent\n    FROM orders GROUP BY customer_id\n)\nSELECT * FROM totals;"
        );
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_ignores_leading_whitespace() {
        assert_eq!(extract_sql("   select 1;"), "select 1;");
        assert_eq!(extract_sql("Delete from logs;"), "Delete from logs;");
    }

    #[test]
    fn only_the_first_statement_is_captured() {
        let raw = "SELECT 1;\nSELECT 2;";
        assert_eq!(extract_sql(raw), "SELECT 1;");
    }

    #[test]
    fn later_keyword_lines_are_body_text() {
        let raw = "INSERT INTO archive\nSELECT * FROM orders\nWHERE id > 10;\ntrailing";
        assert_eq!(extract_sql(raw), "INSERT INTO archive\nSELECT * FROM orders\nWHERE id > 10;");
    }

    #[test]
    fn commented_statement_is_not_found() {
        let raw = "-- top customers\n  FROM orders;";
        assert_eq!(extract_sql(raw), "");
    }

    #[test]
    fn prefix_match_is_not_word_bounded() {
        // "Selected" starts with SELECT once upper-cased
        let raw = "Selected rows below\nnothing here;";
        assert_eq!(extract_sql(raw), "Selected rows below\nnothing here;");
    }

    #[test]
    fn carriage_returns_are_preserved_inside_the_statement() {
        let raw = "ok\r\nSELECT a\r\nFROM b;\r\nbye";
        assert_eq!(extract_sql(raw), "SELECT a\r\nFROM b;");
    }

    #[test]
    fn terminator_on_keyword_line_stops_immediately() {
        let raw = "UPDATE t SET a = 1;\nUPDATE t SET a = 2;";
        assert_eq!(extract_sql(raw), "UPDATE t SET a = 1;");
    }
}
