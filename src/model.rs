//! Data model for query feature extraction and coverage checking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a top-level boolean branch inside a query predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalKind {
    /// Chain of `and`-joined sub-conditions
    And,
    /// Branch dominated by a top-level `or`
    Or,
    /// `not(...)` call
    Not,
    /// Plain comparison (`=`, `!=`, relational)
    Comparison,
    /// `if (...) then ... else ...` expression
    If,
    /// `some`/`every` quantified expression
    Quantified,
    /// Standalone `$function(...)` call used as a boolean
    BooleanFunction,
}

impl fmt::Display for ConditionalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionalKind::And => write!(f, "and"),
            ConditionalKind::Or => write!(f, "or"),
            ConditionalKind::Not => write!(f, "not"),
            ConditionalKind::Comparison => write!(f, "comparison"),
            ConditionalKind::If => write!(f, "if"),
            ConditionalKind::Quantified => write!(f, "quantified"),
            ConditionalKind::BooleanFunction => write!(f, "boolean_function"),
        }
    }
}

/// A top-level boolean branch extracted from the query text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    /// Branch kind, drives checker strategy dispatch
    pub kind: ConditionalKind,

    /// Exact sub-expression text
    pub expression: String,

    /// Byte offset of the expression within the query text, if known
    pub position: Option<usize>,
}

impl Conditional {
    /// Create a conditional with a known position
    pub fn new(kind: ConditionalKind, expression: &str, position: usize) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            position: Some(position),
        }
    }

    /// Create a conditional whose position could not be determined
    pub fn unpositioned(kind: ConditionalKind, expression: &str) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            position: None,
        }
    }

    /// Label used in reports and uncovered-branch lists, e.g. `or: $isEmptyString(@Name)`
    pub fn label(&self) -> String {
        format!("{}: {}", self.kind, self.expression)
    }
}

/// Flat model of the testable structural elements of one query expression
///
/// Produced by [`crate::extract::extract_features`]; a pure function of the
/// query text. All sequences are deduplicated preserving first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFeatureModel {
    /// Node-type names referenced via `//Ident` or `.//Ident`
    pub node_types: Vec<String>,

    /// Attribute names referenced via `@Ident` (the reserved operator
    /// attribute is never included)
    pub attributes: Vec<String>,

    /// Operator tokens found outside string literals
    pub operators: Vec<String>,

    /// Top-level boolean branches
    pub conditionals: Vec<Conditional>,

    /// Query uses `let $x := ...` bindings
    pub has_let_expressions: bool,

    /// Query uses the `|` union operator at top level
    pub has_unions: bool,
}

impl QueryFeatureModel {
    /// True when extraction found nothing checkable at all
    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty()
            && self.attributes.is_empty()
            && self.operators.is_empty()
            && self.conditionals.is_empty()
    }
}

/// One annotated example embedded in a rule definition file
///
/// Produced by the rule-file parser; the coverage engine treats it as
/// read-only input and never mutates or persists it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleSource {
    /// Full example text, markers included
    pub content: String,

    /// Code lines marked as rule-triggering
    pub violations: Vec<String>,

    /// Code lines marked as explicitly non-triggering
    pub valids: Vec<String>,
}

impl ExampleSource {
    /// Create an example with no resolved marker lines
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            violations: Vec::new(),
            valids: Vec::new(),
        }
    }

    /// True when the example carries no code at all
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Join all example contents into one searchable text
pub fn combined_source(examples: &[ExampleSource]) -> String {
    let mut combined = String::new();
    for example in examples {
        combined.push_str(&example.content);
        combined.push('\n');
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_kind_display() {
        assert_eq!(format!("{}", ConditionalKind::And), "and");
        assert_eq!(format!("{}", ConditionalKind::Or), "or");
        assert_eq!(
            format!("{}", ConditionalKind::BooleanFunction),
            "boolean_function"
        );
    }

    #[test]
    fn test_conditional_label() {
        let cond = Conditional::new(ConditionalKind::Or, "$isEmptyString(@Name)", 12);
        assert_eq!(cond.label(), "or: $isEmptyString(@Name)");
        assert_eq!(cond.position, Some(12));
    }

    #[test]
    fn test_unpositioned_conditional() {
        let cond = Conditional::unpositioned(ConditionalKind::Not, "not(@Static)");
        assert_eq!(cond.position, None);
    }

    #[test]
    fn test_empty_model() {
        let model = QueryFeatureModel::default();
        assert!(model.is_empty());
        assert!(!model.has_let_expressions);
        assert!(!model.has_unions);
    }

    #[test]
    fn test_combined_source() {
        let examples = vec![
            ExampleSource::from_content("class A { }"),
            ExampleSource::from_content("class B { }"),
        ];
        let combined = combined_source(&examples);
        assert!(combined.contains("class A"));
        assert!(combined.contains("class B"));
    }

    #[test]
    fn test_example_is_empty() {
        assert!(ExampleSource::from_content("  \n ").is_empty());
        assert!(!ExampleSource::from_content("if (x) { }").is_empty());
    }
}
