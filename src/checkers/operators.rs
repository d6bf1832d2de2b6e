//! Operator coverage heuristics
//!
//! An operator counts as exercised when its token or a recognized ASCII
//! synonym appears in the example source (`&&` stands in for `and`, `==`
//! for `=`).

use super::{keyword_present, FeatureChecker};
use crate::locate::LocateContext;
use crate::model::{combined_source, ExampleSource, QueryFeatureModel};
use crate::report::{CategoryKind, CoverageResult};

fn operator_synonyms(operator: &str) -> &'static [&'static str] {
    match operator {
        "and" => &["and", "&&"],
        "or" => &["or", "||"],
        "=" => &["=", "=="],
        "!=" => &["!="],
        "<" => &["<"],
        "<=" => &["<="],
        ">" => &[">"],
        ">=" => &[">="],
        "+" => &["+"],
        "-" => &["-"],
        "*" => &["*"],
        "/" => &["/"],
        _ => &[],
    }
}

/// Token-presence operator checker
pub struct OperatorChecker;

impl FeatureChecker for OperatorChecker {
    fn category(&self) -> CategoryKind {
        CategoryKind::Operators
    }

    fn check(
        &self,
        model: &QueryFeatureModel,
        examples: &[ExampleSource],
        ctx: &LocateContext,
    ) -> Option<CoverageResult> {
        if model.operators.is_empty() {
            return None;
        }

        let source = combined_source(examples);
        let mut covered = 0;
        let mut missing_labels = Vec::new();
        let mut missing_described = Vec::new();

        for operator in &model.operators {
            let synonyms = operator_synonyms(operator);
            let exercised = if synonyms.is_empty() {
                source.contains(operator.as_str())
            } else {
                synonyms
                    .iter()
                    .any(|synonym| keyword_present(&source, synonym))
            };
            if exercised {
                covered += 1;
            } else {
                missing_labels.push(operator.clone());
                missing_described.push(ctx.describe(operator, None));
            }
        }

        Some(CoverageResult::category(
            CategoryKind::Operators,
            covered,
            model.operators.len(),
            missing_labels,
            missing_described,
        ))
    }
}
