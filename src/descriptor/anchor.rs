//! Locating constructs in descriptor text
//!
//! Nothing here knows which commands exist. Callers pass the keyword and the
//! delimiters; offsets are byte offsets into the text.

use std::ops::Range;

/// Byte offset of the last `keyword` standing alone as an identifier
/// outside strings and `#` comments
pub fn find_last(text: &str, keyword: &str) -> Option<usize> {
    keyword_starts(text, keyword).last().copied()
}

/// Offsets of every `keyword` in code, skipping double-quoted strings and
/// `#` line comments
fn keyword_starts(text: &str, keyword: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    if keyword.is_empty() {
        return starts;
    }
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;
    let mut skip_until = 0;

    for (offset, c) in text.char_indices() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '#' => in_comment = true,
            _ if offset >= skip_until
                && text[offset..].starts_with(keyword)
                && stands_alone(text, offset, keyword.len()) =>
            {
                starts.push(offset);
                skip_until = offset + keyword.len();
            }
            _ => {}
        }
    }
    starts
}

fn stands_alone(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    before.is_none_or(|c| !is_identifier_char(c)) && after.is_none_or(|c| !is_identifier_char(c))
}

/// Offset of the `close` balancing the first `open` at or after `from`.
///
/// Delimiters inside double-quoted strings and `#` line comments are not
/// counted. `None` when there is no `open` or it is never closed.
pub fn find_matching_delimiter(text: &str, from: usize, open: char, close: char) -> Option<usize> {
    let tail = text.get(from..)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;

    for (offset, c) in tail.char_indices() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '#' => in_comment = true,
            _ if c == open => depth += 1,
            _ if c == close && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Every `keyword( ... )` construct in code, from the keyword to its closing
/// parenthesis inclusive. Commented-out and quoted occurrences are skipped.
pub fn constructs(text: &str, keyword: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut search_from = 0;

    for start in keyword_starts(text, keyword) {
        if start < search_from {
            continue;
        }
        let after = start + keyword.len();
        if !text[after..].trim_start_matches([' ', '\t']).starts_with('(') {
            continue;
        }
        if let Some(end) = find_matching_delimiter(text, after, '(', ')') {
            found.push(start..end + 1);
            search_from = end + 1;
        }
    }
    found
}

/// Widen `range` to cover its indentation and the following line break
pub fn with_line(text: &str, range: Range<usize>) -> Range<usize> {
    let indent = text[..range.start]
        .chars()
        .rev()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();
    let line_start = range.start - indent;
    let starts_line = line_start == 0 || text[..line_start].ends_with('\n');
    let start = if starts_line { line_start } else { range.start };

    let rest = &text[range.end..];
    let end = if rest.starts_with("\r\n") {
        range.end + 2
    } else if rest.starts_with('\n') {
        range.end + 1
    } else {
        range.end
    };
    start..end
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
