//! Splitting of compound AND conditions into independently-checkable parts
//!
//! A single left-to-right scan tracks quote state and nesting depth so that
//! splitting never breaks a quoted literal or a parenthesized sub-expression,
//! even when that sub-expression itself contains the word `and`.

/// Byte offsets of top-level, word-bounded occurrences of `word`
///
/// An occurrence counts only when it is outside single/double quotes, at
/// nesting depth zero (parens, brackets and braces), preceded by whitespace
/// or start-of-string and followed by whitespace or end-of-string.
///
/// Unbalanced quotes or parens never panic: the scan simply runs to the end
/// of the string in whatever state it is in.
pub(crate) fn top_level_word_offsets(expr: &str, word: &str) -> Vec<usize> {
    let bytes = expr.as_bytes();
    let wbytes = word.as_bytes();
    let wlen = wbytes.len();
    let mut offsets = Vec::new();
    let mut quote: Option<u8> = None;
    let mut depth: i32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            // Backslash escapes the next character inside a literal
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
            _ => {
                if depth == 0 && bytes[i..].starts_with(wbytes) {
                    let before_ok = i == 0 || bytes[i - 1].is_ascii_whitespace();
                    let after = i + wlen;
                    let after_ok = after >= bytes.len() || bytes[after].is_ascii_whitespace();
                    if before_ok && after_ok {
                        offsets.push(i);
                        i += wlen;
                        continue;
                    }
                }
            }
        }
        i += 1;
    }

    offsets
}

/// Split an AND-chain into its parts, keeping each part's byte offset
///
/// Parts are trimmed and empty parts dropped; offsets point at the first
/// non-whitespace byte of each part within `expr`.
pub fn split_and_chain_with_offsets(expr: &str) -> Vec<(String, usize)> {
    if expr.trim().is_empty() {
        return Vec::new();
    }

    let offsets = top_level_word_offsets(expr, "and");
    if offsets.is_empty() {
        return vec![(expr.to_string(), 0)];
    }

    let mut parts = Vec::new();
    let mut start = 0;
    for &off in &offsets {
        push_trimmed(&mut parts, expr, start, off);
        start = off + 3;
    }
    push_trimmed(&mut parts, expr, start, expr.len());

    // A chain of nothing but `and` keywords still yields the original text
    if parts.is_empty() {
        parts.push((expr.trim().to_string(), 0));
    }
    parts
}

/// Split an AND-chain into its independently-testable parts
///
/// Returns the original expression as a single element when no top-level
/// `and` is found; never returns an empty result for non-empty input.
pub fn split_and_chain(expr: &str) -> Vec<String> {
    split_and_chain_with_offsets(expr)
        .into_iter()
        .map(|(part, _)| part)
        .collect()
}

fn push_trimmed(parts: &mut Vec<(String, usize)>, expr: &str, start: usize, end: usize) {
    let segment = &expr[start..end];
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = segment.len() - segment.trim_start().len();
    parts.push((trimmed.to_string(), start + lead));
}
