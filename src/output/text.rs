//! Human-readable text output formatter

use super::ReportFormatter;
use crate::engine::{FileReport, RuleReport, RunResult};
use colored::*;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show per-category detail even for fully covered rules
    pub show_all_categories: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_all_categories: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Show category detail for covered rules too
    pub fn verbose(mut self) -> Self {
        self.show_all_categories = true;
        self
    }

    fn status(&self, covered: bool) -> String {
        let s = if covered { "covered" } else { "uncovered" };
        if !self.colored {
            return s.to_string();
        }
        if covered {
            s.green().bold().to_string()
        } else {
            s.red().bold().to_string()
        }
    }

    fn format_rule(&self, rule: &RuleReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "  {}: {}\n",
            if self.colored {
                rule.name.cyan().to_string()
            } else {
                rule.name.clone()
            },
            self.status(rule.report.overall_success)
        ));

        if rule.report.coverage.is_empty() {
            output.push_str("    no query or no examples to check\n");
            return output;
        }

        for result in &rule.report.coverage {
            if result.success && !self.show_all_categories {
                continue;
            }
            output.push_str(&format!("    {}\n", result.message));
            for evidence in &result.evidence {
                for line in evidence.description.lines() {
                    let line = if self.colored {
                        line.red().to_string()
                    } else {
                        line.to_string()
                    };
                    output.push_str(&format!("      {}\n", line));
                }
            }
        }

        output
    }
}

impl ReportFormatter for TextFormatter {
    fn format(&self, result: &RunResult) -> String {
        let mut output = String::new();

        for file in &result.files {
            output.push_str(&self.format_file(file));
            output.push('\n');
        }

        if self.show_stats {
            output.push_str(&format!(
                "{} {} processed: {} rules checked, {} fully covered",
                result.files_processed,
                if result.files_processed == 1 {
                    "file"
                } else {
                    "files"
                },
                result.rules_checked,
                result.rules_covered,
            ));
            if result.uncovered_branch_count > 0 {
                let s = format!(
                    ", {} uncovered {}",
                    result.uncovered_branch_count,
                    if result.uncovered_branch_count == 1 {
                        "branch"
                    } else {
                        "branches"
                    }
                );
                output.push_str(&if self.colored { s.red().to_string() } else { s });
            }
            output.push('\n');
            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_file(&self, file: &FileReport) -> String {
        let mut output = String::new();

        let path = file.path.display().to_string();
        if self.colored {
            output.push_str(&format!("{}\n", path.underline()));
        } else {
            output.push_str(&format!("{}\n", path));
        }

        if let Some(error) = &file.error {
            let line = format!("  error: {}", error);
            output.push_str(&if self.colored {
                format!("{}\n", line.red())
            } else {
                format!("{}\n", line)
            });
            return output;
        }

        for rule in &file.rules {
            output.push_str(&self.format_rule(rule));
        }

        output
    }
}
