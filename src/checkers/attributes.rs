//! Attribute coverage heuristics
//!
//! Attributes with a known lexical footprint get a dedicated keyword check
//! (a null-related attribute needs the `null` literal in source, a modifier
//! attribute needs its modifier keyword). Everything else falls back to a
//! case-insensitive substring test on the attribute name.

use super::{keyword_present, FeatureChecker};
use crate::locate::LocateContext;
use crate::model::{combined_source, ExampleSource, QueryFeatureModel};
use crate::report::{CategoryKind, CoverageResult};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static ATTRIBUTE_KEYWORDS: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let entries: &[(&str, &[&str])] = &[
            ("Static", &["static"]),
            ("Final", &["final"]),
            ("Abstract", &["abstract"]),
            ("Public", &["public"]),
            ("Private", &["private"]),
            ("Protected", &["protected"]),
            ("Global", &["global"]),
            ("Override", &["override"]),
            ("Virtual", &["virtual"]),
            ("Transient", &["transient"]),
            ("Synchronized", &["synchronized"]),
            ("Constructor", &["new"]),
            ("Synthetic", &["new"]),
        ];
        entries.iter().copied().collect()
    });

/// Is this attribute exercised by the example source?
///
/// Shared with the conditional checker, which tests attribute references
/// inside branch parts with the same heuristics.
pub(crate) fn attribute_exercised(name: &str, source: &str) -> bool {
    if let Some(keywords) = ATTRIBUTE_KEYWORDS.get(name) {
        return keywords
            .iter()
            .any(|keyword| keyword_present(source, keyword));
    }
    if name.contains("Null") {
        return keyword_present(source, "null");
    }
    source.to_lowercase().contains(&name.to_lowercase())
}

/// Per-attribute heuristic checker with a substring fallback
pub struct AttributeChecker;

impl FeatureChecker for AttributeChecker {
    fn category(&self) -> CategoryKind {
        CategoryKind::Attributes
    }

    fn check(
        &self,
        model: &QueryFeatureModel,
        examples: &[ExampleSource],
        ctx: &LocateContext,
    ) -> Option<CoverageResult> {
        if model.attributes.is_empty() {
            return None;
        }

        let source = combined_source(examples);
        let mut covered = 0;
        let mut missing_labels = Vec::new();
        let mut missing_described = Vec::new();

        for attribute in &model.attributes {
            if attribute_exercised(attribute, &source) {
                covered += 1;
            } else {
                missing_labels.push(attribute.clone());
                missing_described.push(ctx.describe(attribute, None));
            }
        }

        Some(CoverageResult::category(
            CategoryKind::Attributes,
            covered,
            model.attributes.len(),
            missing_labels,
            missing_described,
        ))
    }
}
