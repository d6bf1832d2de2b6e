//! Rule definition file parsing
//!
//! Extracts each rule's query expression and its annotated examples from a
//! rule-definition XML file. This is targeted scanning, not a DOM parse: the
//! engine only needs the query text (verbatim, so line offsets survive) and
//! the example code blocks.
//!
//! Three query storage encodings are recognized:
//! - single-line attribute form: `xpath="..."` or `name="xpath" value="..."`
//! - multi-line `<value>` block under the xpath property
//! - CDATA-wrapped `<value>` block

use crate::model::ExampleSource;
use once_cell::sync::Lazy;
use quick_xml::escape::unescape;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rule-file parsing error
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("IO error reading rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed rule file: {0}")]
    Malformed(String),
}

static NAME_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"name\s*=\s*"([^"]*)""#).unwrap());

static XPATH_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"xpath\s*=\s*"([^"]*)""#).unwrap());

static XPATH_PROPERTY_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"name\s*=\s*"xpath"[^>]*\bvalue\s*=\s*"([^"]*)""#).unwrap());

static EXAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<example>(.*?)</example>").unwrap());

const VIOLATION_MARKER: &str = "// violation";
const VALID_MARKERS: [&str; 2] = ["// no violation", "// ok"];

/// One rule with its query and embedded examples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCase {
    /// Rule name from the `name` attribute, or a positional fallback
    pub name: String,

    /// Extracted query expression, verbatim; `None` for rules without one
    pub query: Option<String>,

    /// Annotated examples embedded in the rule body
    pub examples: Vec<ExampleSource>,
}

/// A parsed rule definition file
#[derive(Debug, Clone)]
pub struct Ruleset {
    /// Path the file was read from
    pub path: PathBuf,

    /// Raw file text, read once and reused for all line lookups
    pub text: String,

    /// Rules in file order
    pub rules: Vec<RuleCase>,
}

impl Ruleset {
    /// Read and parse a rule definition file
    pub fn load(path: &Path) -> Result<Self, RulesetError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, text))
    }

    /// Parse already-read rule file text
    pub fn parse(path: &Path, text: String) -> Self {
        let rules = parse_rules(&text);
        Self {
            path: path.to_path_buf(),
            text,
            rules,
        }
    }
}

/// Scan for `<rule ...>` blocks, tolerating self-closing rules
fn parse_rules(text: &str) -> Vec<RuleCase> {
    let mut rules = Vec::new();
    let mut search_from = 0;

    while let Some(found) = text[search_from..].find("<rule") {
        let open_at = search_from + found;
        let Some(tag_end_rel) = text[open_at..].find('>') else {
            break;
        };
        let tag_end = open_at + tag_end_rel;
        let attrs = &text[open_at..tag_end];

        // `<ruleset>` and friends also start with `<rule`
        let after_tag_name = attrs.as_bytes().get(5).copied();
        if !matches!(after_tag_name, None | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            search_from = tag_end + 1;
            continue;
        }

        let name = NAME_ATTR_RE
            .captures(attrs)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| format!("rule-{}", rules.len() + 1));

        if attrs.trim_end().ends_with('/') {
            // Self-closing rule: attribute-form query only, no examples
            rules.push(RuleCase {
                name,
                query: extract_query(attrs),
                examples: Vec::new(),
            });
            search_from = tag_end + 1;
            continue;
        }

        let body_start = tag_end + 1;
        let body_end = match text[body_start..].find("</rule>") {
            Some(rel) => body_start + rel,
            None => text.len(),
        };
        let block = &text[open_at..body_end];

        rules.push(RuleCase {
            name,
            query: extract_query(block),
            examples: extract_examples(block),
        });
        search_from = body_end;
    }

    rules
}

/// Extract the query expression from a rule block, trying the attribute
/// forms before the `<value>` block form
fn extract_query(block: &str) -> Option<String> {
    if let Some(caps) = XPATH_PROPERTY_VALUE_RE.captures(block) {
        return Some(unescape_or_raw(&caps[1]));
    }
    if let Some(caps) = XPATH_ATTR_RE.captures(block) {
        return Some(unescape_or_raw(&caps[1]));
    }
    value_block_content(block)
}

/// Content of the xpath property's `<value>` element, verbatim
///
/// CDATA content is taken as-is; plain content is entity-unescaped. Either
/// way newlines are preserved so offset-based line attribution stays valid.
fn value_block_content(block: &str) -> Option<String> {
    let property_at = block.find(r#"name="xpath""#).unwrap_or(0);
    let scope = &block[property_at..];
    let value_at = scope.find("<value>")?;
    let content_start = value_at + "<value>".len();
    let content_end = content_start + scope[content_start..].find("</value>")?;
    let content = &scope[content_start..content_end];

    if let Some(cdata) = strip_cdata(content) {
        return Some(cdata.to_string());
    }
    Some(unescape_or_raw(content))
}

fn strip_cdata(content: &str) -> Option<&str> {
    let trimmed = content.trim_start();
    let after_open = trimmed.strip_prefix("<![CDATA[")?;
    let close = after_open.rfind("]]>")?;
    Some(&after_open[..close])
}

fn unescape_or_raw(text: &str) -> String {
    unescape(text)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// Extract annotated examples, resolving inline violation/valid markers
fn extract_examples(block: &str) -> Vec<ExampleSource> {
    EXAMPLE_RE
        .captures_iter(block)
        .map(|caps| {
            let raw = &caps[1];
            let content = match strip_cdata(raw) {
                Some(cdata) => cdata.to_string(),
                None => unescape_or_raw(raw),
            };
            example_from_content(content)
        })
        .collect()
}

fn example_from_content(content: String) -> ExampleSource {
    let mut violations = Vec::new();
    let mut valids = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains(VIOLATION_MARKER) {
            violations.push(trimmed.to_string());
        } else if VALID_MARKERS.iter().any(|marker| trimmed.contains(marker)) {
            valids.push(trimmed.to_string());
        }
    }
    ExampleSource {
        content,
        violations,
        valids,
    }
}
