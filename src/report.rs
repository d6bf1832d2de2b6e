//! Coverage results, evidence and the aggregate report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature category a coverage result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    NodeTypes,
    Attributes,
    Operators,
    Conditionals,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::NodeTypes => write!(f, "Node types"),
            CategoryKind::Attributes => write!(f, "Attributes"),
            CategoryKind::Operators => write!(f, "Operators"),
            CategoryKind::Conditionals => write!(f, "Conditionals"),
        }
    }
}

/// Count-based evidence for one category check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEvidence {
    /// Features found covered
    pub count: usize,

    /// Features that needed to be covered
    pub required: usize,

    /// Human-readable detail, one line per missing feature with its
    /// best-available `Line N:` prefix
    pub description: String,

    /// Category this evidence belongs to
    pub kind: CategoryKind,
}

/// Per-category coverage outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// True iff every required feature in the category was matched
    pub success: bool,

    /// One-line summary
    pub message: String,

    /// Count evidence (one entry per check pass)
    pub evidence: Vec<CoverageEvidence>,

    /// Plain labels of the missing features, used for branch formatting
    pub details: Vec<String>,
}

impl CoverageResult {
    /// Build a category result from a checker's counts and missing lists
    ///
    /// `missing_labels` are the plain feature labels; `missing_described`
    /// the matching line-annotated descriptions. Counts are clamped so the
    /// `count <= required` invariant always holds.
    pub fn category(
        kind: CategoryKind,
        covered: usize,
        required: usize,
        missing_labels: Vec<String>,
        missing_described: Vec<String>,
    ) -> Self {
        let covered = covered.min(required);
        let success = covered == required;
        let message = if success {
            format!("{}: {} of {} covered", kind, covered, required)
        } else {
            format!(
                "{}: {} of {} covered, {} missing",
                kind,
                covered,
                required,
                missing_labels.len()
            )
        };
        Self {
            success,
            message,
            evidence: vec![CoverageEvidence {
                count: covered,
                required,
                description: missing_described.join("\n"),
                kind,
            }],
            details: missing_labels,
        }
    }

    /// Category this result was produced for
    pub fn kind(&self) -> Option<CategoryKind> {
        self.evidence.first().map(|e| e.kind)
    }
}

/// Combined report across all checked categories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// One result per category that had features to check
    pub coverage: Vec<CoverageResult>,

    /// True iff every checked category succeeded and at least one category
    /// was checked
    pub overall_success: bool,

    /// Flattened `Category: feature` labels for every unmatched feature
    pub uncovered_branches: Vec<String>,
}

impl AggregateReport {
    /// Report for inputs with nothing to check (empty query or no examples)
    ///
    /// Coverage cannot be declared complete over nothing, so
    /// `overall_success` is false.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Combine per-category results into one report
///
/// Callers pass only categories that had features to check; categories with
/// zero features are omitted entirely and contribute nothing to the AND.
/// Node-type, attribute and operator categories each contribute a single
/// comma-joined branch string; conditionals contribute one branch string per
/// missing branch.
pub fn aggregate(results: Vec<CoverageResult>) -> AggregateReport {
    let overall_success = !results.is_empty() && results.iter().all(|r| r.success);

    let mut uncovered_branches = Vec::new();
    for result in &results {
        if result.success || result.details.is_empty() {
            continue;
        }
        match result.kind() {
            Some(CategoryKind::Conditionals) => {
                for label in &result.details {
                    uncovered_branches.push(format!("{}: {}", CategoryKind::Conditionals, label));
                }
            }
            Some(kind) => {
                uncovered_branches.push(format!("{}: {}", kind, result.details.join(", ")));
            }
            None => {}
        }
    }

    AggregateReport {
        coverage: results,
        overall_success,
        uncovered_branches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failed(kind: CategoryKind, missing: &[&str]) -> CoverageResult {
        let labels: Vec<String> = missing.iter().map(|s| s.to_string()).collect();
        CoverageResult::category(kind, 0, labels.len(), labels.clone(), labels)
    }

    fn passed(kind: CategoryKind, required: usize) -> CoverageResult {
        CoverageResult::category(kind, required, required, Vec::new(), Vec::new())
    }

    #[test]
    fn test_empty_report() {
        let report = AggregateReport::empty();
        assert!(report.coverage.is_empty());
        assert!(!report.overall_success);
        assert!(report.uncovered_branches.is_empty());
    }

    #[test]
    fn test_aggregate_of_nothing_is_not_success() {
        let report = aggregate(Vec::new());
        assert!(!report.overall_success);
    }

    #[test]
    fn test_all_categories_passing() {
        let report = aggregate(vec![
            passed(CategoryKind::NodeTypes, 2),
            passed(CategoryKind::Attributes, 1),
            passed(CategoryKind::Operators, 1),
            passed(CategoryKind::Conditionals, 1),
        ]);
        assert_eq!(report.coverage.len(), 4);
        assert!(report.overall_success);
        assert!(report.uncovered_branches.is_empty());
    }

    #[test]
    fn test_one_failure_fails_overall() {
        let report = aggregate(vec![
            passed(CategoryKind::NodeTypes, 1),
            failed(CategoryKind::Attributes, &["NonExistent"]),
        ]);
        assert!(!report.overall_success);
        assert_eq!(report.uncovered_branches, vec!["Attributes: NonExistent"]);
    }

    #[test]
    fn test_flat_categories_comma_join_missing() {
        let report = aggregate(vec![failed(CategoryKind::Operators, &["and", "!="])]);
        assert_eq!(report.uncovered_branches, vec!["Operators: and, !="]);
    }

    #[test]
    fn test_conditionals_one_branch_per_missing() {
        let report = aggregate(vec![failed(
            CategoryKind::Conditionals,
            &["or: $isEmptyString(@Name)", "not: not(@Static)"],
        )]);
        assert_eq!(
            report.uncovered_branches,
            vec![
                "Conditionals: or: $isEmptyString(@Name)",
                "Conditionals: not: not(@Static)",
            ]
        );
    }

    #[test]
    fn test_count_clamped_to_required() {
        let result = CoverageResult::category(CategoryKind::Operators, 5, 2, Vec::new(), Vec::new());
        assert_eq!(result.evidence[0].count, 2);
        assert!(result.success);
    }

    #[test]
    fn test_category_message() {
        let result = failed(CategoryKind::NodeTypes, &["IfStatement"]);
        assert!(result.message.contains("0 of 1"));
        assert!(!result.success);
    }
}
