//! Line-number attribution for query features
//!
//! Maps a feature (by text and optional byte offset within the query) back to
//! its 1-based line number in the rule definition file. Three strategies are
//! tried in order, first success wins:
//!
//! 1. single-line attribute form (`xpath="..."` or `name="xpath" value="..."`)
//! 2. textual scan of the `<value>` block lines, CDATA-aware
//! 3. offset fallback: line of the `<value>` content start plus the newline
//!    count in the query text preceding the feature's offset
//!
//! Every failure mode (feature absent, no `<value>` element, unknown offset)
//! degrades to `None`, which renders as a description with no line prefix.

use quick_xml::escape::escape;

const CDATA_OPEN: &str = "<![CDATA[";
const VALUE_OPEN: &str = "<value>";
const VALUE_CLOSE: &str = "</value>";

/// Locate a feature's 1-based line number in the rule file text
///
/// `query_text` is the already-extracted query expression and `position` the
/// feature's byte offset within it, when known. The caller is expected to
/// read the rule file once and reuse the text across all lookups for that
/// file.
pub fn locate_feature(
    file_text: &str,
    query_text: &str,
    feature: &str,
    position: Option<usize>,
) -> Option<usize> {
    let needle = feature_needle(feature);
    if needle.is_empty() {
        return None;
    }

    single_line_search(file_text, &needle)
        .or_else(|| value_block_search(file_text, &needle))
        .or_else(|| offset_fallback(file_text, query_text, position))
}

/// Format a missing-feature description, prefixing the line when known
pub fn describe_with_line(feature: &str, line: Option<usize>) -> String {
    match line {
        Some(n) => format!("Line {}: {}", n, feature),
        None => feature.to_string(),
    }
}

/// Locator inputs shared by all checkers for one rule file
#[derive(Debug, Clone, Copy)]
pub struct LocateContext<'a> {
    /// Raw rule-definition file text, read once per file
    pub file_text: Option<&'a str>,

    /// The extracted query expression
    pub query_text: &'a str,
}

impl<'a> LocateContext<'a> {
    pub fn new(file_text: Option<&'a str>, query_text: &'a str) -> Self {
        Self {
            file_text,
            query_text,
        }
    }

    /// Context with no rule file available; every lookup yields `None`
    pub fn without_file(query_text: &'a str) -> Self {
        Self {
            file_text: None,
            query_text,
        }
    }

    pub fn line_of(&self, feature: &str, position: Option<usize>) -> Option<usize> {
        self.file_text
            .and_then(|text| locate_feature(text, self.query_text, feature, position))
    }

    /// Missing-feature description with its best-available line number
    pub fn describe(&self, feature: &str, position: Option<usize>) -> String {
        describe_with_line(feature, self.line_of(feature, position))
    }
}

/// Multi-line features are searched by their first non-empty line
fn feature_needle(feature: &str) -> String {
    feature
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Strategy 1: the query is an inline attribute on a single line
fn single_line_search(file_text: &str, needle: &str) -> Option<usize> {
    let escaped = escape(needle);
    for (idx, line) in file_text.lines().enumerate() {
        let is_query_line = line.contains("xpath=\"")
            || (line.contains("\"xpath\"") && line.contains("value=\""));
        if is_query_line && (line.contains(needle) || line.contains(escaped.as_ref())) {
            return Some(idx + 1);
        }
    }
    None
}

/// Strategy 2: scan the lines of each `<value>` block
///
/// Line numbers are actual file lines, so a feature on the line after a
/// CDATA-open marker naturally reports that later line.
fn value_block_search(file_text: &str, needle: &str) -> Option<usize> {
    let escaped = escape(needle);
    let mut in_block = false;
    for (idx, line) in file_text.lines().enumerate() {
        if !in_block {
            if line.contains(VALUE_OPEN) {
                in_block = true;
                // The value may open and match on the same line
                if line.contains(needle) || line.contains(escaped.as_ref()) {
                    return Some(idx + 1);
                }
            }
            continue;
        }
        if line.contains(needle) || line.contains(escaped.as_ref()) {
            return Some(idx + 1);
        }
        if line.contains(VALUE_CLOSE) {
            in_block = false;
        }
    }
    None
}

/// Strategy 3: count newlines in the query text preceding the offset
///
/// The extracted value content is verbatim, so a CDATA-open marker that ends
/// its line leaves a leading newline in the content and the first content
/// line naturally lands on the line after the marker.
fn offset_fallback(file_text: &str, query_text: &str, position: Option<usize>) -> Option<usize> {
    let position = position?;
    let value_at = file_text.find(VALUE_OPEN)?;
    let mut content_start = value_at + VALUE_OPEN.len();

    let rest = &file_text[content_start..];
    let after_ws = rest.trim_start();
    if after_ws.starts_with(CDATA_OPEN) {
        content_start += (rest.len() - after_ws.len()) + CDATA_OPEN.len();
    }

    let start_line = 1 + count_newlines(&file_text[..content_start]);
    let clamped = position.min(query_text.len());
    Some(start_line + count_newlines(&query_text[..clamped]))
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}
