//! Per-category coverage checkers
//!
//! One checker per feature category, each answering "is this feature
//! exercised by the example source?" with category-specific heuristics. The
//! mapping from category to implementation is table-driven so each heuristic
//! is independently testable and swappable.

mod attributes;
mod conditionals;
mod node_types;
mod operators;

pub use attributes::AttributeChecker;
pub use conditionals::ConditionalChecker;
pub use node_types::NodeTypeChecker;
pub use operators::OperatorChecker;

pub(crate) use attributes::attribute_exercised;

use crate::locate::LocateContext;
use crate::model::{ExampleSource, QueryFeatureModel};
use crate::report::{CategoryKind, CoverageResult};
use regex::Regex;

/// A coverage heuristic for one feature category
///
/// Checkers never fail for "not found" — that is a normal `success: false`
/// result. A category with nothing to check returns `None` and is omitted
/// from the aggregate report entirely.
pub trait FeatureChecker: Send + Sync {
    /// Category this checker is responsible for
    fn category(&self) -> CategoryKind;

    /// Check the relevant slice of the feature model against the examples
    fn check(
        &self,
        model: &QueryFeatureModel,
        examples: &[ExampleSource],
        ctx: &LocateContext,
    ) -> Option<CoverageResult>;
}

/// The full checker set, in report order
pub fn all_checkers() -> Vec<Box<dyn FeatureChecker>> {
    vec![
        Box::new(NodeTypeChecker),
        Box::new(AttributeChecker),
        Box::new(OperatorChecker),
        Box::new(ConditionalChecker),
    ]
}

/// Presence test for a keyword in example source
///
/// Alphanumeric keywords match on word boundaries so `if` does not match
/// inside `identifier`; anything with punctuation falls back to a plain
/// substring test.
pub(crate) fn keyword_present(source: &str, keyword: &str) -> bool {
    let is_word = !keyword.is_empty()
        && keyword
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_word {
        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        Regex::new(&pattern)
            .map(|re| re.is_match(source))
            .unwrap_or(false)
    } else {
        source.contains(keyword)
    }
}
