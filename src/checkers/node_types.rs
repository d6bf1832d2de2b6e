//! Node-type coverage heuristics
//!
//! Each node type maps to representative source keywords; the type counts as
//! exercised when any of its keywords appears in the example source. Node
//! types with no lexical representation (synthesized by the analyzer) are
//! skipped from the checkable set entirely rather than reported as
//! always-missing. Nested type declarations need a structural scan instead
//! of a keyword lookup.

use super::{keyword_present, FeatureChecker};
use crate::locate::LocateContext;
use crate::model::{combined_source, ExampleSource, QueryFeatureModel};
use crate::report::{CategoryKind, CoverageResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Node types that exist only in the analyzer's tree shape and have no
/// keyword an example could contain
static STRUCTURAL_NODE_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "CompilationUnit",
        "BlockStatement",
        "ExpressionStatement",
        "ModifierNode",
        "PrimaryExpression",
        "PrimaryPrefix",
        "PrimarySuffix",
        "Name",
        "TypeNode",
        "ResultType",
        "Method",
        "MethodDeclaration",
        "MethodCall",
        "MethodCallExpression",
        "FieldDeclaration",
        "Field",
        "Parameter",
        "VariableDeclaration",
        "VariableExpression",
        "VariableDeclaratorId",
        "LiteralExpression",
        "BinaryExpression",
    ]
    .into_iter()
    .collect()
});

/// Node types whose detection needs the brace-depth scan for a type
/// declaration nested inside another type body
static NESTED_TYPE_NODE_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["NestedClassDeclaration", "InnerClassDeclaration", "NestedTypeDeclaration"]
        .into_iter()
        .collect()
});

static NODE_TYPE_KEYWORDS: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let entries: &[(&str, &[&str])] = &[
            ("IfStatement", &["if", "else if"]),
            ("IfElseStatement", &["else if", "else"]),
            ("ForStatement", &["for"]),
            ("ForLoopStatement", &["for"]),
            ("ForEachStatement", &["for"]),
            ("WhileStatement", &["while"]),
            ("WhileLoopStatement", &["while"]),
            ("DoWhileStatement", &["do"]),
            ("DoLoopStatement", &["do"]),
            ("SwitchStatement", &["switch"]),
            ("SwitchCase", &["case", "when"]),
            ("TryCatchFinallyBlockStatement", &["try"]),
            ("TryStatement", &["try"]),
            ("CatchBlockStatement", &["catch"]),
            ("CatchClause", &["catch"]),
            ("FinallyBlockStatement", &["finally"]),
            ("ReturnStatement", &["return"]),
            ("ThrowStatement", &["throw"]),
            ("BreakStatement", &["break"]),
            ("ContinueStatement", &["continue"]),
            ("ClassDeclaration", &["class"]),
            ("UserClass", &["class"]),
            ("InterfaceDeclaration", &["interface"]),
            ("UserInterface", &["interface"]),
            ("EnumDeclaration", &["enum"]),
            ("UserEnum", &["enum"]),
            ("NewExpression", &["new"]),
            ("NewObjectExpression", &["new"]),
            ("ObjectCreationExpression", &["new"]),
            ("NullLiteral", &["null"]),
            ("BooleanLiteral", &["true", "false"]),
            ("ThisExpression", &["this"]),
            ("SuperExpression", &["super"]),
            ("Annotation", &["@"]),
            ("TernaryExpression", &["?"]),
            ("ConditionalExpression", &["?"]),
        ];
        entries.iter().copied().collect()
    });

static TYPE_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(class|interface|enum)\s+\w+").unwrap());

/// How one node type is verified against example source
enum NodeRequirement {
    Keywords(Vec<String>),
    NestedTypeDeclaration,
}

/// Resolve a node type to its check, or `None` when it is purely structural
fn requirement_for(node_type: &str) -> Option<NodeRequirement> {
    if STRUCTURAL_NODE_TYPES.contains(node_type) {
        return None;
    }
    if NESTED_TYPE_NODE_TYPES.contains(node_type) {
        return Some(NodeRequirement::NestedTypeDeclaration);
    }
    if let Some(keywords) = NODE_TYPE_KEYWORDS.get(node_type) {
        return Some(NodeRequirement::Keywords(
            keywords.iter().map(|k| k.to_string()).collect(),
        ));
    }
    // Derive a candidate keyword from the name itself; BreakStatement and
    // friends resolve without a table entry
    let stripped = node_type
        .strip_suffix("Statement")
        .or_else(|| node_type.strip_suffix("Expression"))
        .or_else(|| node_type.strip_suffix("Declaration"))
        .or_else(|| node_type.strip_suffix("Literal"))
        .unwrap_or(node_type);
    if stripped.is_empty() {
        return None;
    }
    Some(NodeRequirement::Keywords(vec![stripped.to_lowercase()]))
}

/// Detect a type declaration nested inside another type's body
///
/// Scans the source tracking brace depth; coverage requires a type-decl
/// keyword seen while already one or more braces deep inside an earlier
/// type declaration, not merely present anywhere.
fn has_nested_type_declaration(source: &str) -> bool {
    let decl_offsets: Vec<usize> = TYPE_DECL_RE.find_iter(source).map(|m| m.start()).collect();
    if decl_offsets.len() < 2 {
        return false;
    }

    let mut depth: i32 = 0;
    let mut inside_type = false;
    let mut next_decl = 0;
    for (offset, c) in source.char_indices() {
        if next_decl < decl_offsets.len() && decl_offsets[next_decl] == offset {
            if inside_type && depth >= 1 {
                return true;
            }
            inside_type = true;
            next_decl += 1;
        }
        match c {
            '{' => depth += 1,
            '}' => depth = (depth - 1).max(0),
            _ => {}
        }
    }
    false
}

/// Keyword-table node-type checker
pub struct NodeTypeChecker;

impl FeatureChecker for NodeTypeChecker {
    fn category(&self) -> CategoryKind {
        CategoryKind::NodeTypes
    }

    fn check(
        &self,
        model: &QueryFeatureModel,
        examples: &[ExampleSource],
        ctx: &LocateContext,
    ) -> Option<CoverageResult> {
        let source = combined_source(examples);
        let mut required = 0;
        let mut covered = 0;
        let mut missing_labels = Vec::new();
        let mut missing_described = Vec::new();

        for node_type in &model.node_types {
            let Some(requirement) = requirement_for(node_type) else {
                continue;
            };
            required += 1;
            let exercised = match requirement {
                NodeRequirement::Keywords(keywords) => keywords
                    .iter()
                    .any(|keyword| keyword_present(&source, keyword)),
                NodeRequirement::NestedTypeDeclaration => has_nested_type_declaration(&source),
            };
            if exercised {
                covered += 1;
            } else {
                missing_labels.push(node_type.clone());
                missing_described.push(ctx.describe(node_type, None));
            }
        }

        if required == 0 {
            return None;
        }
        Some(CoverageResult::category(
            CategoryKind::NodeTypes,
            covered,
            required,
            missing_labels,
            missing_described,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExampleSource;
    use pretty_assertions::assert_eq;

    fn check(query_types: &[&str], source: &str) -> Option<CoverageResult> {
        let model = QueryFeatureModel {
            node_types: query_types.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let examples = vec![ExampleSource::from_content(source)];
        let ctx = LocateContext::without_file("");
        NodeTypeChecker.check(&model, &examples, &ctx)
    }

    #[test]
    fn test_keyword_match_covers() {
        let result = check(&["IfStatement", "ForStatement"], "for (x) { if (y) { } }").unwrap();
        assert!(result.success);
        assert_eq!(result.evidence[0].count, 2);
        assert_eq!(result.evidence[0].required, 2);
    }

    #[test]
    fn test_missing_keyword_reported() {
        let result = check(&["WhileStatement"], "if (x) { }").unwrap();
        assert!(!result.success);
        assert_eq!(result.details, vec!["WhileStatement"]);
    }

    #[test]
    fn test_structural_types_skipped_entirely() {
        assert!(check(&["Method", "CompilationUnit"], "class A { }").is_none());
    }

    #[test]
    fn test_derived_keyword_fallback() {
        let result = check(&["BreakStatement"], "while (x) { break; }").unwrap();
        assert!(result.success);
    }

    #[test]
    fn test_nested_type_requires_nesting() {
        let nested = "public class Outer {\n  class Inner { }\n}\n";
        let flat = "public class Outer { }\npublic class Other { }\n";
        let result = check(&["NestedClassDeclaration"], nested).unwrap();
        assert!(result.success);
        let result = check(&["NestedClassDeclaration"], flat).unwrap();
        assert!(!result.success);
    }

    #[test]
    fn test_nested_type_same_line_braces() {
        assert!(has_nested_type_declaration(
            "class Outer { interface Inner { } }"
        ));
    }

    #[test]
    fn test_if_does_not_match_inside_identifier() {
        let result = check(&["IfStatement"], "int identifier = 0;").unwrap();
        assert!(!result.success);
    }
}
