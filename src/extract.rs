//! Feature extraction from query expression text
//!
//! Scans the raw query text and returns a flat [`QueryFeatureModel`] of
//! node-type references, attribute names, operator tokens and top-level
//! boolean branches. This is targeted scanning over the expression text, not
//! a grammar for the query language: nested function bodies and quoted
//! literals are treated as opaque.

use crate::model::{Conditional, ConditionalKind, QueryFeatureModel};
use crate::split::{split_and_chain_with_offsets, top_level_word_offsets};
use once_cell::sync::Lazy;
use regex::Regex;

/// Attribute name reserved for encoding binary operators; it denotes an
/// operator, not a semantic attribute, and is never reported
const OPERATOR_ATTRIBUTE: &str = "Op";

static NODE_TYPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.?//([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static AND_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\band\b").unwrap());
static OR_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bor\b").unwrap());
static LET_BINDING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\blet\s+\$").unwrap());

/// Extract the testable structural elements of a query expression
///
/// Pure and deterministic: identical input text always yields a structurally
/// equal model. An empty or all-whitespace query yields an all-empty model,
/// which is a valid result, not an error.
pub fn extract_features(query: &str) -> QueryFeatureModel {
    if query.trim().is_empty() {
        return QueryFeatureModel::default();
    }

    let masked = mask_literals(query);

    QueryFeatureModel {
        node_types: extract_node_types(&masked),
        attributes: extract_attributes(&masked),
        operators: extract_operators(&masked),
        conditionals: extract_conditionals(query),
        has_let_expressions: LET_BINDING_RE.is_match(&masked),
        has_unions: has_union_operator(&masked),
    }
}

/// Replace the contents of string literals (delimiters included) with spaces,
/// preserving byte length so offsets into the masked text stay valid
fn mask_literals(query: &str) -> String {
    let bytes = query.as_bytes();
    let mut out = bytes.to_vec();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match quote {
            Some(q) => {
                if c == b'\\' {
                    out[i] = b' ';
                    if i + 1 < bytes.len() {
                        out[i + 1] = b' ';
                    }
                    i += 2;
                    continue;
                }
                out[i] = b' ';
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == b'\'' || c == b'"' {
                    quote = Some(c);
                    out[i] = b' ';
                }
            }
        }
        i += 1;
    }

    // All replaced bytes are ASCII spaces, so the result stays valid UTF-8
    String::from_utf8(out).unwrap_or_else(|_| query.to_string())
}

fn extract_node_types(masked: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in NODE_TYPE_RE.captures_iter(masked) {
        let name = &caps[1];
        if !name.starts_with(char::is_uppercase) {
            continue;
        }
        if !seen.iter().any(|n| n == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

fn extract_attributes(masked: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in ATTRIBUTE_RE.captures_iter(masked) {
        let name = &caps[1];
        if name == OPERATOR_ATTRIBUTE {
            continue;
        }
        if !seen.iter().any(|n| n == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Recognized operator tokens in first-appearance order
fn extract_operators(masked: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = Vec::new();

    for m in AND_WORD_RE.find_iter(masked) {
        found.push((m.start(), "and"));
    }
    for m in OR_WORD_RE.find_iter(masked) {
        found.push((m.start(), "or"));
    }
    found.extend(symbol_operator_offsets(masked));

    found.sort_by_key(|(offset, _)| *offset);

    let mut operators = Vec::new();
    for (_, token) in found {
        if !operators.iter().any(|t| t == token) {
            operators.push(token.to_string());
        }
    }
    operators
}

/// Scan for symbol operators, skipping path separators and wildcards
///
/// Arithmetic symbols (`+ - * /`) only count when whitespace-delimited on
/// both sides, so `//Method` and the `*` node wildcard are not misread.
fn symbol_operator_offsets(masked: &str) -> Vec<(usize, &'static str)> {
    let bytes = masked.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'!' if bytes.get(i + 1) == Some(&b'=') => {
                found.push((i, "!="));
                i += 2;
                continue;
            }
            b'<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    found.push((i, "<="));
                    i += 2;
                    continue;
                }
                found.push((i, "<"));
            }
            b'>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    found.push((i, ">="));
                    i += 2;
                    continue;
                }
                found.push((i, ">"));
            }
            b'=' => found.push((i, "=")),
            c @ (b'+' | b'-' | b'*' | b'/') => {
                let before_ws = i == 0 || bytes[i - 1].is_ascii_whitespace();
                let after_ws = i + 1 >= bytes.len() || bytes[i + 1].is_ascii_whitespace();
                if before_ws && after_ws {
                    let token = match c {
                        b'+' => "+",
                        b'-' => "-",
                        b'*' => "*",
                        _ => "/",
                    };
                    found.push((i, token));
                }
            }
            _ => {}
        }
        i += 1;
    }

    found
}

fn has_union_operator(masked: &str) -> bool {
    let bytes = masked.as_bytes();
    bytes.iter().enumerate().any(|(i, &c)| {
        c == b'|'
            && bytes.get(i.wrapping_sub(1)).copied() != Some(b'|')
            && bytes.get(i + 1).copied() != Some(b'|')
    })
}

/// Identify top-level boolean branches inside predicate blocks
fn extract_conditionals(query: &str) -> Vec<Conditional> {
    let mut conditionals = Vec::new();
    for (start, end) in top_level_predicates(query) {
        classify_branches(&query[start..end], start, &mut conditionals);
    }
    conditionals
}

/// Byte spans of predicate contents (`[...]`) outside parens and quotes
///
/// An unterminated predicate at end-of-string is flushed as-is so malformed
/// input stays checkable.
fn top_level_predicates(query: &str) -> Vec<(usize, usize)> {
    let bytes = query.as_bytes();
    let mut spans = Vec::new();
    let mut quote: Option<u8> = None;
    let mut paren: i32 = 0;
    let mut bracket: i32 = 0;
    let mut start = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' => quote = Some(c),
            b'(' => paren += 1,
            b')' => paren = (paren - 1).max(0),
            b'[' if paren == 0 => {
                bracket += 1;
                if bracket == 1 {
                    start = i + 1;
                }
            }
            b']' if paren == 0 && bracket > 0 => {
                bracket -= 1;
                if bracket == 0 {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
        i += 1;
    }

    if bracket > 0 && start <= bytes.len() {
        spans.push((start, bytes.len()));
    }
    spans
}

/// Record the boolean branches of one predicate content
///
/// An AND-chain produces one `And` conditional spanning the chain; each part
/// with its own top-level structure (or / not / if / quantified / function /
/// comparison) is additionally recorded under that kind.
fn classify_branches(content: &str, base: usize, out: &mut Vec<Conditional>) {
    let parts = split_and_chain_with_offsets(content);
    if parts.is_empty() {
        return;
    }

    if parts.len() >= 2 {
        let trimmed = content.trim();
        let lead = content.len() - content.trim_start().len();
        out.push(Conditional::new(ConditionalKind::And, trimmed, base + lead));
    }

    for (part, offset) in &parts {
        if let Some(kind) = classify_part(part) {
            out.push(Conditional::new(kind, part, base + offset));
        }
    }
}

fn classify_part(part: &str) -> Option<ConditionalKind> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !top_level_word_offsets(trimmed, "or").is_empty() {
        return Some(ConditionalKind::Or);
    }
    if trimmed.starts_with("not(") || trimmed.starts_with("not (") {
        return Some(ConditionalKind::Not);
    }
    if trimmed.starts_with("if(") || trimmed.starts_with("if (") {
        return Some(ConditionalKind::If);
    }
    if trimmed.starts_with("some ") || trimmed.starts_with("every ") {
        return Some(ConditionalKind::Quantified);
    }
    if trimmed.starts_with('$') && trimmed.contains('(') {
        return Some(ConditionalKind::BooleanFunction);
    }
    if has_top_level_comparison(trimmed) {
        return Some(ConditionalKind::Comparison);
    }
    None
}

/// True when a comparison operator appears outside quotes at depth zero
fn has_top_level_comparison(expr: &str) -> bool {
    let bytes = expr.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth: i32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' => quote = Some(c),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = (depth - 1).max(0),
            b'=' | b'<' | b'>' if depth == 0 => return true,
            b'!' if depth == 0 && bytes.get(i + 1) == Some(&b'=') => return true,
            _ => {}
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_query_yields_empty_model() {
        assert_eq!(extract_features(""), QueryFeatureModel::default());
        assert_eq!(extract_features("   \n\t"), QueryFeatureModel::default());
    }

    #[test]
    fn test_node_types_dedup_first_seen_order() {
        let model = extract_features("//Method//IfStatement | //Method");
        assert_eq!(model.node_types, vec!["Method", "IfStatement"]);
        assert!(model.has_unions);
    }

    #[test]
    fn test_descendant_self_axis() {
        let model = extract_features("//ClassDeclaration[.//ReturnStatement]");
        assert_eq!(model.node_types, vec!["ClassDeclaration", "ReturnStatement"]);
    }

    #[test]
    fn test_lowercase_steps_are_not_node_types() {
        let model = extract_features("//child::text");
        assert!(model.node_types.is_empty());
    }

    #[test]
    fn test_operator_attribute_excluded() {
        let model = extract_features("//BinaryExpression[@Op = '+' and @Name]");
        assert_eq!(model.attributes, vec!["Name"]);
    }

    #[test]
    fn test_operators_outside_literals_only() {
        let model = extract_features("//Method[@Name = 'a and b']");
        assert!(model.operators.contains(&"=".to_string()));
        assert!(!model.operators.contains(&"and".to_string()));
    }

    #[test]
    fn test_textual_operators_whole_word() {
        // `and` inside an identifier must not register
        let model = extract_features("//Method[@Operand]");
        assert!(!model.operators.contains(&"and".to_string()));
        assert!(!model.operators.contains(&"or".to_string()));
    }

    #[test]
    fn test_path_slashes_are_not_division() {
        let model = extract_features("//Method//Parameter");
        assert!(!model.operators.contains(&"/".to_string()));
    }

    #[test]
    fn test_arithmetic_operators() {
        let model = extract_features("//Method[count(.//Parameter) + 1 > 3]");
        assert!(model.operators.contains(&"+".to_string()));
        assert!(model.operators.contains(&">".to_string()));
    }

    #[test]
    fn test_relational_operators() {
        let model = extract_features("//Method[@Arity >= 2 and @Depth <= 4 and @Kind != 'x']");
        assert!(model.operators.contains(&">=".to_string()));
        assert!(model.operators.contains(&"<=".to_string()));
        assert!(model.operators.contains(&"!=".to_string()));
    }

    #[test]
    fn test_and_chain_conditional() {
        let model = extract_features("//Method[@Flag and @OtherFlag]");
        assert_eq!(model.conditionals.len(), 1);
        assert_eq!(model.conditionals[0].kind, ConditionalKind::And);
        assert_eq!(model.conditionals[0].expression, "@Flag and @OtherFlag");
        assert!(model.conditionals[0].position.is_some());
    }

    #[test]
    fn test_or_branch_conditional() {
        let model = extract_features("//Method[@Flag or @OtherFlag]");
        assert_eq!(model.conditionals.len(), 1);
        assert_eq!(model.conditionals[0].kind, ConditionalKind::Or);
    }

    #[test]
    fn test_and_chain_with_or_part() {
        let model = extract_features("//Method[@Flag and (@A) or $isEmptyString(@Name)]");
        let kinds: Vec<_> = model.conditionals.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&ConditionalKind::And));
        assert!(kinds.contains(&ConditionalKind::Or));
    }

    #[test]
    fn test_not_conditional() {
        let model = extract_features("//Field[not(@Static)]");
        assert_eq!(model.conditionals.len(), 1);
        assert_eq!(model.conditionals[0].kind, ConditionalKind::Not);
        assert_eq!(model.conditionals[0].expression, "not(@Static)");
    }

    #[test]
    fn test_comparison_conditional() {
        let model = extract_features("//Method[@Name = 'execute']");
        assert_eq!(model.conditionals.len(), 1);
        assert_eq!(model.conditionals[0].kind, ConditionalKind::Comparison);
    }

    #[test]
    fn test_quantified_conditional() {
        let model = extract_features("//Method[some $p in .//Parameter satisfies $p/@Final]");
        assert_eq!(model.conditionals[0].kind, ConditionalKind::Quantified);
    }

    #[test]
    fn test_boolean_function_conditional() {
        let model = extract_features("//Method[$isEmptyString(@ReturnType)]");
        assert_eq!(model.conditionals[0].kind, ConditionalKind::BooleanFunction);
    }

    #[test]
    fn test_nested_predicate_is_opaque() {
        // The inner predicate sits at bracket depth two and is not decomposed
        let model = extract_features("//Class[.//Method[@A and @B]]");
        assert!(model.conditionals.is_empty());
        assert_eq!(model.attributes, vec!["A", "B"]);
    }

    #[test]
    fn test_let_expression_flag() {
        let model = extract_features("let $n := //Method return $n[@Static]");
        assert!(model.has_let_expressions);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let query = "//Method[@Flag and @OtherFlag or not(@Static)]";
        assert_eq!(extract_features(query), extract_features(query));
    }

    #[test]
    fn test_conditional_positions_index_into_query() {
        let query = "//Method[@Flag and @OtherFlag]";
        let model = extract_features(query);
        let cond = &model.conditionals[0];
        let pos = cond.position.unwrap();
        assert!(query[pos..].starts_with(&cond.expression));
    }

    #[test]
    fn test_unterminated_predicate_is_flushed() {
        let model = extract_features("//Method[@Flag and @Other");
        assert_eq!(model.conditionals.len(), 1);
        assert_eq!(model.conditionals[0].kind, ConditionalKind::And);
    }
}
