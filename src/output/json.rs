//! JSON output formatter

use super::ReportFormatter;
use crate::engine::{FileReport, RunResult};
use crate::report::AggregateReport;
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn serialize<T: Serialize>(&self, value: &T) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: Vec<JsonFile<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    rules: Vec<JsonRule<'a>>,
}

#[derive(Serialize)]
struct JsonRule<'a> {
    name: &'a str,
    #[serde(flatten)]
    report: &'a AggregateReport,
}

#[derive(Serialize)]
struct JsonSummary {
    files_processed: usize,
    rules_checked: usize,
    rules_covered: usize,
    uncovered_branch_count: usize,
    error_count: usize,
    duration_ms: u128,
}

fn json_file(file: &FileReport) -> JsonFile {
    JsonFile {
        path: file.path.display().to_string(),
        error: file.error.as_deref(),
        rules: file
            .rules
            .iter()
            .map(|rule| JsonRule {
                name: &rule.name,
                report: &rule.report,
            })
            .collect(),
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, result: &RunResult) -> String {
        let output = JsonOutput {
            files: result.files.iter().map(json_file).collect(),
            summary: JsonSummary {
                files_processed: result.files_processed,
                rules_checked: result.rules_checked,
                rules_covered: result.rules_covered,
                uncovered_branch_count: result.uncovered_branch_count,
                error_count: result.error_count,
                duration_ms: result.duration.as_millis(),
            },
        };
        self.serialize(&output)
    }

    fn format_file(&self, file: &FileReport) -> String {
        self.serialize(&json_file(file))
    }
}
