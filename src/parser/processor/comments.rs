//! CDATA and comment blanking

use super::{ProcessingContext, TemplateProcessor, blank_region};
use crate::parser::error::ParseResult;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Blanks CDATA blocks, including nested ones
///
/// The whole block (markers included) becomes whitespace; line count is
/// preserved so later error messages keep their line numbers.
pub struct CdataProcessor;

impl TemplateProcessor for CdataProcessor {
    fn name(&self) -> &'static str {
        "cdata"
    }

    fn pre_process(&self, source: String, _ctx: &mut ProcessingContext<'_>) -> ParseResult<String> {
        if !source.contains(CDATA_OPEN) {
            return Ok(source);
        }
        let mut result = String::with_capacity(source.len());
        let mut rest = source.as_str();
        while let Some(start) = rest.find(CDATA_OPEN) {
            result.push_str(&rest[..start]);
            let after_open = &rest[start..];
            let end = matching_close(after_open);
            let block = &after_open[..end];
            result.push_str(&blank_region(block));
            rest = &after_open[end..];
        }
        result.push_str(rest);
        Ok(result)
    }
}

/// Length of the CDATA block starting at the beginning of `s`, honoring
/// nested opens; an unterminated block runs to the end of the source
fn matching_close(s: &str) -> usize {
    let mut depth = 0usize;
    let mut pos = 0;
    let bytes = s.as_bytes();
    while pos < bytes.len() {
        if s[pos..].starts_with(CDATA_OPEN) {
            depth += 1;
            pos += CDATA_OPEN.len();
        } else if s[pos..].starts_with(CDATA_CLOSE) {
            depth = depth.saturating_sub(1);
            pos += CDATA_CLOSE.len();
            if depth == 0 {
                return pos;
            }
        } else {
            pos += 1;
        }
    }
    s.len()
}

/// Blanks the body of comment tags, keeping the wrapping tags in place
///
/// The tags themselves stay as literal markers so the parser still sees a
/// well-formed (empty) comment helper; the blanked body keeps its newlines.
pub struct CommentProcessor;

impl TemplateProcessor for CommentProcessor {
    fn name(&self) -> &'static str {
        "comments"
    }

    fn pre_process(&self, source: String, _ctx: &mut ProcessingContext<'_>) -> ParseResult<String> {
        if !source.contains(":comment") {
            return Ok(source);
        }
        let mut result = String::with_capacity(source.len());
        let mut rest = source.as_str();
        loop {
            let Some((open_start, open_len, alias)) = find_comment_open(rest) else {
                result.push_str(rest);
                break;
            };
            let open_end = open_start + open_len;
            let close_tag = format!("</{alias}:comment>");
            result.push_str(&rest[..open_end]);
            match rest[open_end..].find(&close_tag) {
                Some(body_len) => {
                    result.push_str(&blank_region(&rest[open_end..open_end + body_len]));
                    result.push_str(&close_tag);
                    rest = &rest[open_end + body_len + close_tag.len()..];
                }
                None => {
                    // Unterminated comment; the parser will report it
                    result.push_str(&rest[open_end..]);
                    break;
                }
            }
        }
        Ok(result)
    }
}

/// Find the next `<alias:comment>` opening tag; returns (offset, length, alias)
fn find_comment_open(s: &str) -> Option<(usize, usize, String)> {
    let mut search_from = 0;
    while let Some(rel) = s[search_from..].find(":comment") {
        let colon = search_from + rel;
        // Walk back over the alias to the '<'
        let head = &s[..colon];
        let alias_start = head
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let alias = &head[alias_start..];
        let preceded_by_open = alias_start > 0 && head.as_bytes()[alias_start - 1] == b'<';
        let after = &s[colon + ":comment".len()..];
        if preceded_by_open && !alias.is_empty() && after.starts_with('>') {
            let open_len = (colon + ":comment>".len()) - (alias_start - 1);
            return Some((alias_start - 1, open_len, alias.to_string()));
        }
        search_from = colon + ":comment".len();
    }
    None
}
