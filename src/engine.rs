//! Coverage engine and run orchestration
//!
//! The core entry point is [`check_coverage`]: purely functional, reads only
//! its inputs and allocates only local structures, so concurrent invocations
//! need no locking. The [`Engine`] wraps it with per-file orchestration: one
//! file read per rule file, reused across all locator lookups, and a rayon
//! pool across files sized to the configured job count.

use crate::checkers::all_checkers;
use crate::config::Config;
use crate::extract::extract_features;
use crate::locate::LocateContext;
use crate::model::{Conditional, ExampleSource, QueryFeatureModel};
use crate::report::{aggregate, AggregateReport};
use crate::ruleset::{RuleCase, Ruleset};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Run the coverage check for one rule
///
/// A `None`/empty query or an empty example sequence yields an empty report
/// with `overall_success: false`: there is nothing to have covered, so
/// coverage cannot be declared complete. This is a boundary case, not an
/// error path.
pub fn check_coverage(
    query: Option<&str>,
    examples: &[ExampleSource],
    file_text: Option<&str>,
) -> AggregateReport {
    let Some(query) = query else {
        return AggregateReport::empty();
    };
    if query.trim().is_empty() || examples.is_empty() {
        return AggregateReport::empty();
    }

    let model = extract_features(query);
    let ctx = LocateContext::new(file_text, query);
    let results = all_checkers()
        .iter()
        .filter_map(|checker| checker.check(&model, examples, &ctx))
        .collect();
    aggregate(results)
}

/// Coverage outcome for one rule
#[derive(Debug, Clone)]
pub struct RuleReport {
    /// Rule name
    pub name: String,

    /// Aggregate coverage report
    pub report: AggregateReport,

    /// Locatable feature lines with their covered flag, for LCOV rendering
    pub line_hits: Vec<(usize, bool)>,
}

/// Coverage outcome for one rule definition file
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Rule file path
    pub path: PathBuf,

    /// Per-rule reports, in file order
    pub rules: Vec<RuleReport>,

    /// Load/parse failure, when the file could not be checked at all
    pub error: Option<String>,
}

impl FileReport {
    /// True when every rule in the file reached full coverage
    pub fn is_fully_covered(&self) -> bool {
        self.error.is_none() && self.rules.iter().all(|r| r.report.overall_success)
    }
}

/// Combined result of a coverage run
#[derive(Debug, Default)]
pub struct RunResult {
    /// Per-file reports
    pub files: Vec<FileReport>,

    /// Files processed
    pub files_processed: usize,

    /// Rules checked
    pub rules_checked: usize,

    /// Rules that reached full coverage
    pub rules_covered: usize,

    /// Total uncovered branches across all rules
    pub uncovered_branch_count: usize,

    /// Files that failed to load or parse
    pub error_count: usize,

    /// Processing duration
    pub duration: Duration,
}

impl RunResult {
    /// Check if any file failed to load
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// True when every checked rule reached full coverage
    pub fn is_fully_covered(&self) -> bool {
        self.error_count == 0 && self.rules_checked == self.rules_covered
    }

    /// Get exit code (0 = full coverage, 1 = gaps, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.rules_checked != self.rules_covered {
            1
        } else {
            0
        }
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: RunResult) {
        self.files.extend(other.files);
        self.files_processed += other.files_processed;
        self.rules_checked += other.rules_checked;
        self.rules_covered += other.rules_covered;
        self.uncovered_branch_count += other.uncovered_branch_count;
        self.error_count += other.error_count;
    }

    fn absorb(&mut self, file: FileReport) {
        self.files_processed += 1;
        if file.error.is_some() {
            self.error_count += 1;
        }
        for rule in &file.rules {
            self.rules_checked += 1;
            if rule.report.overall_success {
                self.rules_covered += 1;
            }
            self.uncovered_branch_count += rule.report.uncovered_branches.len();
        }
        self.files.push(file);
    }
}

/// The coverage run orchestrator
pub struct Engine {
    config: Config,
}

impl Engine {
    /// Create a new engine with configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Check multiple rule files
    pub fn check_files(&self, files: &[PathBuf]) -> RunResult {
        let start = Instant::now();

        let reports: Vec<FileReport> = if self.config.engine.parallel && files.len() > 1 {
            let threads = if self.config.engine.jobs > 0 {
                self.config.engine.jobs
            } else {
                num_cpus::get()
            };
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => {
                    pool.install(|| files.par_iter().map(|f| self.check_file(f)).collect())
                }
                Err(e) => {
                    log::warn!("thread pool setup failed, running serially: {e}");
                    files.iter().map(|f| self.check_file(f)).collect()
                }
            }
        } else {
            files.iter().map(|f| self.check_file(f)).collect()
        };

        let mut combined = RunResult::default();
        for report in reports {
            combined.absorb(report);
        }
        combined.duration = start.elapsed();
        combined
    }

    /// Check a single rule file
    pub fn check_file(&self, path: &Path) -> FileReport {
        let ruleset = match Ruleset::load(path) {
            Ok(ruleset) => ruleset,
            Err(e) => {
                log::warn!("failed to load rule file {}: {}", path.display(), e);
                return FileReport {
                    path: path.to_path_buf(),
                    rules: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let rules = ruleset
            .rules
            .iter()
            .filter(|rule| !self.config.is_rule_ignored(&rule.name))
            .map(|rule| self.check_rule(&ruleset, rule))
            .collect();

        FileReport {
            path: path.to_path_buf(),
            rules,
            error: None,
        }
    }

    fn check_rule(&self, ruleset: &Ruleset, rule: &RuleCase) -> RuleReport {
        let query = rule.query.as_deref();
        let report = check_coverage(query, &rule.examples, Some(&ruleset.text));

        let line_hits = match query {
            Some(query) if !query.trim().is_empty() => {
                let model = extract_features(query);
                let ctx = LocateContext::new(Some(&ruleset.text), query);
                feature_line_hits(&model, &report, &ctx)
            }
            _ => Vec::new(),
        };

        log::debug!(
            "rule {}: {} uncovered branches",
            rule.name,
            report.uncovered_branches.len()
        );

        RuleReport {
            name: rule.name.clone(),
            report,
            line_hits,
        }
    }
}

/// Map each locatable query feature to its file line and covered flag
///
/// A feature counts as uncovered when its label appears among the report's
/// missing details.
fn feature_line_hits(
    model: &QueryFeatureModel,
    report: &AggregateReport,
    ctx: &LocateContext,
) -> Vec<(usize, bool)> {
    let missing: HashSet<&str> = report
        .coverage
        .iter()
        .flat_map(|result| result.details.iter().map(String::as_str))
        .collect();

    let mut hits = Vec::new();
    for feature in model
        .node_types
        .iter()
        .chain(model.attributes.iter())
        .chain(model.operators.iter())
    {
        if let Some(line) = ctx.line_of(feature, None) {
            hits.push((line, !missing.contains(feature.as_str())));
        }
    }
    for conditional in &model.conditionals {
        if let Some(line) = ctx.line_of(&conditional.expression, conditional.position) {
            hits.push((line, !conditional_is_missing(conditional, &missing)));
        }
    }
    hits
}

fn conditional_is_missing(conditional: &Conditional, missing: &HashSet<&str>) -> bool {
    let label = conditional.label();
    missing.iter().any(|entry| {
        if **entry == label {
            return true;
        }
        // AND-chains report per-part labels like `and: <part>`
        entry
            .split_once(": ")
            .is_some_and(|(_, part)| conditional.expression.contains(part))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn example(content: &str) -> ExampleSource {
        ExampleSource::from_content(content)
    }

    #[test]
    fn test_null_query_boundary() {
        let report = check_coverage(None, &[example("if (x) { }")], None);
        assert_eq!(report, AggregateReport::empty());
    }

    #[test]
    fn test_empty_examples_boundary() {
        let report = check_coverage(Some("//Method"), &[], None);
        assert_eq!(report, AggregateReport::empty());
    }

    #[test]
    fn test_whitespace_query_boundary() {
        let report = check_coverage(Some("  \n"), &[example("x")], None);
        assert_eq!(report, AggregateReport::empty());
    }

    #[test]
    fn test_missing_operator_scenario() {
        let report = check_coverage(
            Some("//Method[@Flag and @OtherFlag]"),
            &[example("if (flag) { }")],
            None,
        );
        assert!(!report.overall_success);
        assert!(report
            .uncovered_branches
            .iter()
            .any(|b| b.starts_with("Operators:") && b.contains("and")));
    }

    #[test]
    fn test_missing_attribute_scenario() {
        let report = check_coverage(
            Some("//IfStatement[@NonExistent]"),
            &[example("if (x) { }")],
            None,
        );
        assert!(!report.overall_success);
        assert!(report
            .uncovered_branches
            .contains(&"Attributes: NonExistent".to_string()));
    }

    #[test]
    fn test_all_categories_satisfied() {
        let report = check_coverage(
            Some("//IfStatement[@Flag and @Static]"),
            &[example("static int flag;\nif (flag && x) { }")],
            None,
        );
        assert_eq!(report.coverage.len(), 4);
        assert!(report.overall_success);
        assert!(report.uncovered_branches.is_empty());
    }

    #[test]
    fn test_exit_codes() {
        let mut result = RunResult::default();
        assert_eq!(result.exit_code(), 0);

        result.rules_checked = 1;
        assert_eq!(result.exit_code(), 1);

        result.rules_covered = 1;
        assert_eq!(result.exit_code(), 0);

        result.error_count = 1;
        assert_eq!(result.exit_code(), 2);
    }

    fn write_rule_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_check_file_reports_gaps_with_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rule_file(
            &dir,
            "rules.xml",
            r#"<ruleset>
  <rule name="no-both-flags">
    <property name="xpath" value="//Method[@Flag and @OtherFlag]"/>
    <example><![CDATA[
if (flag) { } // violation
]]></example>
  </rule>
</ruleset>
"#,
        );

        let engine = Engine::new(Config::default());
        let file = engine.check_file(&path);
        assert!(file.error.is_none());
        assert_eq!(file.rules.len(), 1);

        let report = &file.rules[0].report;
        assert!(!report.overall_success);
        // The query sits on line 3 of the file; the missing operator's
        // description carries that line
        let operators = report
            .coverage
            .iter()
            .find(|r| r.message.starts_with("Operators"))
            .unwrap();
        assert!(operators.evidence[0].description.contains("Line 3: and"));
    }

    #[test]
    fn test_cdata_or_branch_reported_past_marker_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rule_file(
            &dir,
            "rules.xml",
            "<ruleset>\n  <rule name=\"cdata-rule\">\n    <property name=\"xpath\">\n      <value><![CDATA[\n//Method[@Flag\n  and @Other or $isEmptyString(@Name)]\n]]></value>\n    </property>\n    <example><![CDATA[\nif (flag) { } // violation\n]]></example>\n  </rule>\n</ruleset>\n",
        );

        let engine = Engine::new(Config::default());
        let file = engine.check_file(&path);
        let report = &file.rules[0].report;
        assert!(!report.overall_success);

        let conditionals = report
            .coverage
            .iter()
            .find(|r| r.message.starts_with("Conditionals"))
            .unwrap();
        // The or-branch sits on line 6, past the CDATA-open marker on line 4
        assert!(conditionals.evidence[0].description.contains("Line 6: or:"));
        assert!(conditionals.evidence[0]
            .description
            .contains("not yet supported"));
    }

    #[test]
    fn test_check_file_load_error() {
        let engine = Engine::new(Config::default());
        let file = engine.check_file(Path::new("/nonexistent/rules.xml"));
        assert!(file.error.is_some());
        assert!(file.rules.is_empty());
    }

    #[test]
    fn test_check_files_counts() {
        let dir = tempfile::tempdir().unwrap();
        let covered = write_rule_file(
            &dir,
            "covered.xml",
            r#"<ruleset>
  <rule name="flag-check">
    <property name="xpath" value="//IfStatement[@Flag]"/>
    <example><![CDATA[
if (flag) { } // violation
]]></example>
  </rule>
</ruleset>
"#,
        );
        let uncovered = write_rule_file(
            &dir,
            "uncovered.xml",
            r#"<ruleset>
  <rule name="ghost">
    <property name="xpath" value="//IfStatement[@NonExistent]"/>
    <example><![CDATA[
if (x) { } // violation
]]></example>
  </rule>
</ruleset>
"#,
        );

        let engine = Engine::new(Config::default());
        let result = engine.check_files(&[covered, uncovered]);
        assert_eq!(result.files_processed, 2);
        assert_eq!(result.rules_checked, 2);
        assert_eq!(result.rules_covered, 1);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_ignored_rules_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rule_file(
            &dir,
            "rules.xml",
            r#"<ruleset>
  <rule name="legacy-old"><property name="xpath" value="//IfStatement"/></rule>
</ruleset>
"#,
        );

        let mut config = Config::default();
        config.rules.ignore.push("legacy-".to_string());
        let engine = Engine::new(config);
        let file = engine.check_file(&path);
        assert!(file.rules.is_empty());
    }

    #[test]
    fn test_merge() {
        let mut a = RunResult {
            files_processed: 1,
            rules_checked: 2,
            rules_covered: 1,
            ..Default::default()
        };
        let b = RunResult {
            files_processed: 1,
            rules_checked: 1,
            rules_covered: 1,
            ..Default::default()
        };
        a.merge(b);
        assert_eq!(a.files_processed, 2);
        assert_eq!(a.rules_checked, 3);
        assert_eq!(a.rules_covered, 2);
    }
}
