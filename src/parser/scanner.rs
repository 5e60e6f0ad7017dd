//! Segment scanner for template source
//!
//! The scanner performs the outer split of source text into literal text,
//! helper tags and shorthand expressions. It is deliberately forgiving:
//! anything that does not match a tag or shorthand form falls back to text,
//! and the structural parser decides what a segment means. This keeps tag
//! bodies containing bare `{`/`}` from being mistaken for expressions and
//! lets ignored namespaces pass through verbatim.

use super::error::{ParseError, ParseResult};
use smallvec::SmallVec;

/// One scanned chunk of template source
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text run
    Text(String),
    /// Opening (or self-closing) helper tag
    TagOpen {
        /// Namespace alias
        namespace: String,
        /// Helper name (may contain `:` and `.`)
        name: String,
        /// Raw attribute span, exactly as written (leading whitespace kept)
        attributes: String,
        /// Whether the tag closed itself (`/>`)
        self_closing: bool,
        /// The complete tag text, for literal fallback
        raw: String,
        /// 1-based source line of the `<`
        line: usize,
    },
    /// Closing helper tag
    TagClose {
        /// Namespace alias
        namespace: String,
        /// Helper name
        name: String,
        /// The complete tag text, for literal fallback
        raw: String,
        /// 1-based source line of the `<`
        line: usize,
    },
    /// Shorthand `{...}` expression (content without the braces)
    Shorthand {
        /// Content between the braces
        content: String,
        /// The complete `{...}` text, for literal fallback
        raw: String,
        /// 1-based source line of the `{`
        line: usize,
    },
}

/// A single parsed tag attribute: name and the raw (still escaped) value
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name
    pub name: String,
    /// Value with surrounding quotes removed and quote escapes resolved
    pub value: String,
}

/// Split template source into segments
pub fn scan(source: &str) -> Vec<Segment> {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < bytes.len() {
        let b = bytes[pos];
        match b {
            b'\\' if pos + 1 < bytes.len() && matches!(bytes[pos + 1], b'{' | b'<') => {
                // Escaped construct: emit the brace/bracket literally
                text.push(bytes[pos + 1] as char);
                pos += 2;
            }
            b'<' => {
                if let Some((segment, consumed)) = scan_tag(source, pos, line) {
                    flush_text(&mut segments, &mut text);
                    line += newlines(&source[pos..pos + consumed]);
                    segments.push(segment);
                    pos += consumed;
                } else {
                    text.push('<');
                    pos += 1;
                }
            }
            b'{' => {
                if let Some((segment, consumed)) = scan_shorthand(source, pos, line) {
                    flush_text(&mut segments, &mut text);
                    line += newlines(&source[pos..pos + consumed]);
                    segments.push(segment);
                    pos += consumed;
                } else {
                    text.push('{');
                    pos += 1;
                }
            }
            b'\n' => {
                text.push('\n');
                line += 1;
                pos += 1;
            }
            _ => {
                // Advance one full UTF-8 character
                let ch_len = utf8_len(b);
                text.push_str(&source[pos..pos + ch_len]);
                pos += ch_len;
            }
        }
    }
    flush_text(&mut segments, &mut text);
    segments
}

fn flush_text(segments: &mut Vec<Segment>, text: &mut String) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

fn newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}

fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

fn is_alias_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b':'
}

/// Try to scan a helper tag starting at `pos` (which holds `<`)
///
/// Returns the segment and the number of bytes consumed, or `None` when the
/// text starting here is not a helper tag (plain HTML, loose `<`, ...).
fn scan_tag(source: &str, pos: usize, line: usize) -> Option<(Segment, usize)> {
    let bytes = source.as_bytes();
    let mut cursor = pos + 1;
    let closing = bytes.get(cursor) == Some(&b'/');
    if closing {
        cursor += 1;
    }

    // Alias up to the first ':'
    let alias_start = cursor;
    while cursor < bytes.len() && is_alias_byte(bytes[cursor]) {
        cursor += 1;
    }
    if cursor == alias_start || bytes.get(cursor) != Some(&b':') {
        return None;
    }
    let namespace = source[alias_start..cursor].to_string();
    cursor += 1;

    // Helper name; may itself contain ':' for hierarchical names
    let name_start = cursor;
    while cursor < bytes.len() && is_name_byte(bytes[cursor]) {
        cursor += 1;
    }
    if cursor == name_start {
        return None;
    }
    let name = source[name_start..cursor].trim_end_matches(':').to_string();
    if name.is_empty() {
        return None;
    }

    if closing {
        // Only optional whitespace allowed before '>'
        let mut end = cursor;
        while end < bytes.len() && bytes[end].is_ascii_whitespace() {
            end += 1;
        }
        if bytes.get(end) != Some(&b'>') {
            return None;
        }
        let raw = source[pos..=end].to_string();
        return Some((
            Segment::TagClose {
                namespace,
                name,
                raw,
                line,
            },
            end + 1 - pos,
        ));
    }

    // Attribute span: everything up to the closing '>', honoring quotes so a
    // '>' inside a quoted value does not terminate the tag
    let attr_start = cursor;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    while cursor < bytes.len() {
        let b = bytes[cursor];
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if b == b'>' {
                    break;
                } else if b == b'<' {
                    return None;
                }
            }
        }
        cursor += 1;
    }
    if cursor >= bytes.len() {
        return None;
    }

    let mut attr_end = cursor;
    let mut self_closing = false;
    if attr_end > attr_start && bytes[attr_end - 1] == b'/' {
        self_closing = true;
        attr_end -= 1;
    }
    let attributes = source[attr_start..attr_end].to_string();
    let raw = source[pos..=cursor].to_string();
    Some((
        Segment::TagOpen {
            namespace,
            name,
            attributes,
            self_closing,
            raw,
            line,
        },
        cursor + 1 - pos,
    ))
}

/// Try to scan a `{...}` shorthand starting at `pos`
///
/// Braces nest; quoted sections are opaque. Returns `None` when no matching
/// closing brace exists.
fn scan_shorthand(source: &str, pos: usize, line: usize) -> Option<(Segment, usize)> {
    let bytes = source.as_bytes();
    let mut cursor = pos + 1;
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    while cursor < bytes.len() {
        let b = bytes[cursor];
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let content = source[pos + 1..cursor].to_string();
                        let raw = source[pos..=cursor].to_string();
                        return Some((
                            Segment::Shorthand {
                                content,
                                raw,
                                line,
                            },
                            cursor + 1 - pos,
                        ));
                    }
                }
                b'\n' => {
                    // Shorthand expressions do not span lines
                    return None;
                }
                _ => {}
            },
        }
        cursor += 1;
    }
    None
}

/// Split a raw attribute span into name/value pairs
///
/// Values must be quoted with `'` or `"`; escaped quotes inside a value are
/// resolved here. Attribute order is preserved.
pub fn parse_attributes(raw: &str, tag: &str) -> ParseResult<SmallVec<[Attribute; 4]>> {
    let bytes = raw.as_bytes();
    let mut attributes: SmallVec<[Attribute; 4]> = SmallVec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let name_start = pos;
        while pos < bytes.len()
            && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'_' | b'-' | b':'))
        {
            pos += 1;
        }
        if pos == name_start {
            return Err(ParseError::MalformedAttributes {
                tag: tag.to_string(),
                detail: format!("unexpected character '{}'", &raw[pos..].chars().next().unwrap_or('?')),
            });
        }
        let name = raw[name_start..pos].to_string();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err(ParseError::MalformedAttributes {
                tag: tag.to_string(),
                detail: format!("attribute '{name}' has no value"),
            });
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let quote = match bytes.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(ParseError::MalformedAttributes {
                    tag: tag.to_string(),
                    detail: format!("value of '{name}' is not quoted"),
                });
            }
        };
        pos += 1;
        let mut value = String::new();
        let mut closed = false;
        while pos < bytes.len() {
            let b = bytes[pos];
            if b == b'\\' && pos + 1 < bytes.len() && (bytes[pos + 1] == quote || bytes[pos + 1] == b'\\')
            {
                value.push(bytes[pos + 1] as char);
                pos += 2;
                continue;
            }
            if b == quote {
                closed = true;
                pos += 1;
                break;
            }
            let ch_len = utf8_len(b);
            value.push_str(&raw[pos..pos + ch_len]);
            pos += ch_len;
        }
        if !closed {
            return Err(ParseError::MalformedAttributes {
                tag: tag.to_string(),
                detail: format!("unterminated value for '{name}'"),
            });
        }
        attributes.push(Attribute { name, value });
    }
    Ok(attributes)
}
