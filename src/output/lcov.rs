//! LCOV tracefile output formatter
//!
//! Emits one `SF:` record per rule file, with a `DA:` line for every query
//! feature the locator could attribute to a file line. A line's hit count is
//! the number of covered features attributed to it, so uncovered branches
//! show up as `DA:<line>,0` and render as missed lines in LCOV viewers.

use super::ReportFormatter;
use crate::engine::{FileReport, RunResult};
use std::collections::BTreeMap;

/// LCOV tracefile formatter
#[derive(Default)]
pub struct LcovFormatter;

impl LcovFormatter {
    /// Create a new LCOV formatter
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for LcovFormatter {
    fn format(&self, result: &RunResult) -> String {
        result.files.iter().map(|f| self.format_file(f)).collect()
    }

    fn format_file(&self, file: &FileReport) -> String {
        // Files that failed to load contribute no record
        if file.error.is_some() {
            return String::new();
        }

        let mut hits: BTreeMap<usize, u64> = BTreeMap::new();
        for rule in &file.rules {
            for &(line, covered) in &rule.line_hits {
                let entry = hits.entry(line).or_insert(0);
                if covered {
                    *entry += 1;
                }
            }
        }

        let mut output = String::new();
        output.push_str("TN:\n");
        output.push_str(&format!("SF:{}\n", file.path.display()));
        for (line, count) in &hits {
            output.push_str(&format!("DA:{},{}\n", line, count));
        }
        let found = hits.len();
        let hit = hits.values().filter(|&&count| count > 0).count();
        output.push_str(&format!("LF:{}\n", found));
        output.push_str(&format!("LH:{}\n", hit));
        output.push_str("end_of_record\n");
        output
    }
}
