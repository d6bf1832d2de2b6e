//! Rulecov - Rule Example Coverage Checker
//!
//! Verifies that the annotated examples embedded in rule definition files
//! exercise every structurally distinct branch of each rule's query
//! expression: the node types it navigates, the attributes it reads, the
//! operators it applies, and the top-level conditional branches of its
//! predicates. Uncovered branches are reported with the file line the
//! feature appears on.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Engine -> Ruleset -> extract -> checkers -> aggregate
//! ```
//!
//! The engine parses each rule file once, extracts a feature model from the
//! rule's query, runs one checker per feature category against the rule's
//! examples, and aggregates the category results into a per-rule report.
//! Checking is heuristic and lexical: a feature counts as exercised when a
//! representative token for it appears in the example source.

pub mod checkers;
pub mod config;
pub mod engine;
pub mod extract;
pub mod locate;
pub mod model;
pub mod output;
pub mod report;
pub mod ruleset;
pub mod split;

// Re-export main types
pub use checkers::{all_checkers, FeatureChecker};
pub use config::{ColorMode, Config, OutputFormat};
pub use engine::{check_coverage, Engine, FileReport, RuleReport, RunResult};
pub use extract::extract_features;
pub use locate::LocateContext;
pub use model::{Conditional, ConditionalKind, ExampleSource, QueryFeatureModel};
pub use output::{formatter_for, JsonFormatter, LcovFormatter, ReportFormatter, TextFormatter};
pub use report::{aggregate, AggregateReport, CategoryKind, CoverageResult};
pub use ruleset::{RuleCase, Ruleset, RulesetError};
pub use split::{split_and_chain, split_and_chain_with_offsets};
