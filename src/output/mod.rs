//! Output formatters for coverage results

mod json;
mod lcov;
mod text;

pub use json::JsonFormatter;
pub use lcov::LcovFormatter;
pub use text::TextFormatter;

use crate::config::{Config, OutputFormat};
use crate::engine::{FileReport, RunResult};

/// Output formatter trait
pub trait ReportFormatter: Send + Sync {
    /// Format the entire run result
    fn format(&self, result: &RunResult) -> String;

    /// Format a single file report
    fn format_file(&self, file: &FileReport) -> String;
}

/// Build the formatter selected by configuration
pub fn formatter_for(config: &Config) -> Box<dyn ReportFormatter> {
    match config.output.format {
        OutputFormat::Text => {
            let mut formatter = TextFormatter::new();
            if !config.output.color.use_color() {
                formatter = formatter.without_color();
            }
            if config.output.verbose {
                formatter = formatter.verbose();
            }
            Box::new(formatter)
        }
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Lcov => Box::new(LcovFormatter::new()),
    }
}
