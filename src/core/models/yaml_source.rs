//! Source spans inside block-style YAML
//!
//! Finds the byte range of the scalar stored under a key path, walking block
//! mappings by indentation. Only that range is ever rewritten, so comments,
//! anchors, quoting and layout elsewhere in the file survive an edit.

use std::ops::Range;

/// How a located scalar is written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

/// Byte range and style of a scalar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScalarSpan {
    pub range: Range<usize>,
    pub style: ScalarStyle,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    text: &'a str,
}

impl Line<'_> {
    fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    fn content(&self) -> &str {
        &self.text[self.indent()..]
    }

    /// Carries a node rather than whitespace, a comment or a document marker
    fn is_significant(&self) -> bool {
        let content = self.content().trim_end();
        !(content.is_empty()
            || content.starts_with('#')
            || content == "---"
            || content == "..."
            || (self.indent() == 0 && content.starts_with('%')))
    }
}

fn lines(source: &str) -> Vec<Line<'_>> {
    let mut start = 0;
    source
        .split_inclusive('\n')
        .map(|raw| {
            let line = Line {
                start,
                text: raw.trim_end_matches('\n').trim_end_matches('\r'),
            };
            start += raw.len();
            line
        })
        .collect()
}

/// Locate the scalar under `path`, e.g. `["jobs", "build", "machine", "image"]`
///
/// Returns `None` when the path is absent or its value is not a single-line
/// scalar (alias, block scalar, flow collection, tagged or multi-line value).
pub(crate) fn locate_scalar(source: &str, path: &[&str]) -> Option<ScalarSpan> {
    let (last, parents) = path.split_last()?;
    let lines = lines(source);

    let mut block = 0..lines.len();
    for key in parents {
        let (index, _) = find_key(&lines, block.clone(), key)?;
        block = children(&lines, index, block.end);
    }

    let (index, value_offset) = find_key(&lines, block, last)?;
    let line = lines[index];
    let (range, style) = scalar_in(line.text, value_offset)?;
    Some(ScalarSpan {
        range: line.start + range.start..line.start + range.end,
        style,
    })
}

/// Write `value` as a scalar in `style`
pub(crate) fn render_scalar(value: &str, style: ScalarStyle) -> String {
    match style {
        ScalarStyle::Plain => value.to_string(),
        ScalarStyle::SingleQuoted => format!("'{}'", value.replace('\'', "''")),
        ScalarStyle::DoubleQuoted => {
            format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
        },
    }
}

/// Find `key` among the entries of the block mapping spanning `block`
///
/// Returns the line index and the byte offset just past the key's colon.
fn find_key(lines: &[Line<'_>], block: Range<usize>, key: &str) -> Option<(usize, usize)> {
    let mut entry_indent = None;
    for index in block {
        let line = lines[index];
        if !line.is_significant() {
            continue;
        }
        let indent = line.indent();
        let expected = *entry_indent.get_or_insert(indent);
        if indent < expected {
            return None;
        }
        if indent > expected {
            continue;
        }
        if let Some((found, after_colon)) = split_key(line.content()) {
            if found == key {
                return Some((index, indent + after_colon));
            }
        }
    }
    None
}

/// Lines belonging to the entry at `index`: deeper lines plus a compact
/// sequence written at the entry's own indent
fn children(lines: &[Line<'_>], index: usize, end: usize) -> Range<usize> {
    let indent = lines[index].indent();
    let stop = (index + 1..end)
        .find(|&i| {
            let line = lines[i];
            line.is_significant()
                && (line.indent() < indent
                    || (line.indent() == indent && !is_sequence_item(line.content())))
        })
        .unwrap_or(end);
    index + 1..stop
}

fn is_sequence_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Split `key: value` into the key text and the offset after the colon
fn split_key(content: &str) -> Option<(String, usize)> {
    if is_sequence_item(content) || content.starts_with('?') {
        return None;
    }

    let (key, rest_at) = match content.chars().next()? {
        '"' => {
            let end = closing_double_quote(content)?;
            (content[1..end].replace("\\\"", "\"").replace("\\\\", "\\"), end + 1)
        },
        '\'' => {
            let end = closing_single_quote(content)?;
            (content[1..end].replace("''", "'"), end + 1)
        },
        _ => {
            let colon = plain_key_colon(content)?;
            (content[..colon].trim_end().to_string(), colon)
        },
    };

    let rest = &content[rest_at..];
    let colon = rest.len() - rest.trim_start().len();
    let after = &rest[colon..];
    let tail = after.strip_prefix(':')?;
    if !(tail.is_empty() || tail.starts_with([' ', '\t'])) {
        return None;
    }
    Some((key, rest_at + colon + 1))
}

fn plain_key_colon(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i] == b':' && bytes.get(i + 1).is_none_or(|next| *next == b' ' || *next == b'\t')
    })
}

/// Index of the `"` closing the string opened at offset 0
fn closing_double_quote(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `'` closing the string opened at offset 0
fn closing_single_quote(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Range and style of the scalar starting at or after `offset` in `line`
fn scalar_in(line: &str, offset: usize) -> Option<(Range<usize>, ScalarStyle)> {
    let mut start = offset + (line[offset..].len() - line[offset..].trim_start().len());

    // An anchor names the node; the scalar follows it.
    if line[start..].starts_with('&') {
        let anchor_end = line[start..]
            .find([' ', '\t'])
            .map_or(line.len(), |i| start + i);
        let rest = &line[anchor_end..];
        start = anchor_end + (rest.len() - rest.trim_start().len());
    }

    let value = &line[start..];
    let (length, style) = match value.chars().next()? {
        '"' => (closing_double_quote(value)? + 1, ScalarStyle::DoubleQuoted),
        '\'' => (closing_single_quote(value)? + 1, ScalarStyle::SingleQuoted),
        '#' | '*' | '|' | '>' | '{' | '[' | '!' | '&' => return None,
        _ => {
            let comment = value.find(" #").or_else(|| value.find("\t#"));
            let raw = comment.map_or(value, |at| &value[..at]);
            (raw.trim_end().len(), ScalarStyle::Plain)
        },
    };

    let trailing = value[length..].trim_start();
    if !(trailing.is_empty() || trailing.starts_with('#')) {
        return None;
    }
    Some((start..start + length, style))
}
