//! Namespace declaration detection and validation

use super::{ProcessingContext, TemplateProcessor, blank_region};
use crate::parser::error::{ParseError, ParseResult};
use once_cell::sync::Lazy;
use regex::Regex;

// `{namespace alias}` ignores the alias, `{namespace alias=Some.Package}`
// registers it. A preceding backslash escapes the declaration; that is
// checked by slicing so adjacent declarations match independently.
static NAMESPACE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{namespace[ \t]+([a-zA-Z_][a-zA-Z0-9_]*)(?:[ \t]*=[ \t]*([a-zA-Z0-9_.\\]+))?[ \t]*\}")
        .expect("namespace declaration pattern is valid")
});

// xmlns-style declaration on any tag
static XMLNS_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s*xmlns:([a-zA-Z_][a-zA-Z0-9_]*)="([^"]+)""#)
        .expect("xmlns pattern is valid")
});

// Namespace URI convention: everything after an `/ns/` path segment is the
// dotted namespace path
static NAMESPACE_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^/]+/ns/(.+)$").expect("namespace uri pattern is valid")
});

// Marker attribute: strip the whole declaring tag from the output
const STRIP_MARKER: &str = r#"data-namespace-vellum="true""#;

// Namespace-qualified fragments whose alias must be known: helper tags and
// inline helper calls
static TAG_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</?([a-zA-Z_][a-zA-Z0-9_]*):[a-zA-Z0-9_.:]+").expect("tag use pattern is valid")
});
static INLINE_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*):[a-zA-Z0-9_.]+\s*\(")
        .expect("inline use pattern is valid")
});

/// Extracts and registers namespace declarations, then validates that every
/// namespace-qualified fragment left in the source uses a known alias
///
/// Both declaration forms are removed from the source. A tag carrying the
/// strip marker attribute is removed entirely, together with its closing
/// tag. Any remaining use of an alias that is neither registered nor ignored
/// fails with an unknown-namespace error naming the offending fragment.
pub struct NamespaceDetectionProcessor;

impl TemplateProcessor for NamespaceDetectionProcessor {
    fn name(&self) -> &'static str {
        "namespaces"
    }

    fn pre_process(&self, source: String, ctx: &mut ProcessingContext<'_>) -> ParseResult<String> {
        let source = register_brace_declarations(source, ctx);
        let source = register_xmlns_declarations(source, ctx)?;
        validate_namespace_uses(&source, ctx)?;
        Ok(source)
    }
}

fn register_brace_declarations(source: String, ctx: &mut ProcessingContext<'_>) -> String {
    if !source.contains("{namespace") {
        return source;
    }
    let mut result = String::with_capacity(source.len());
    let mut last_end = 0;
    for capture in NAMESPACE_DECLARATION.captures_iter(&source) {
        let whole = capture.get(0).expect("capture 0 always present");
        if source[..whole.start()].ends_with('\\') {
            continue;
        }
        let alias = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        match capture.get(2) {
            Some(path) => {
                let path = path.as_str().replace('\\', ".");
                log::debug!("registering namespace {alias} => {path}");
                ctx.resolver.register_namespace(alias, &path);
            }
            None => {
                log::debug!("ignoring namespace {alias}");
                ctx.resolver.ignore_namespace(alias);
            }
        }
        // Declarations cannot span lines, so removal keeps line numbers
        result.push_str(&source[last_end..whole.start()]);
        last_end = whole.end();
    }
    result.push_str(&source[last_end..]);
    result
}

fn register_xmlns_declarations(
    source: String,
    ctx: &mut ProcessingContext<'_>,
) -> ParseResult<String> {
    if !source.contains("xmlns:") {
        return Ok(source);
    }
    let mut result = source;
    // Collected per declaring tag: (tag span, strip whole tag?)
    loop {
        let Some(capture) = XMLNS_DECLARATION
            .captures_iter(&result)
            .find(|c| NAMESPACE_URI.is_match(c.get(2).map(|m| m.as_str()).unwrap_or("")))
        else {
            break;
        };
        let whole = capture.get(0).expect("capture 0 always present");
        let alias = capture.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
        let uri = capture.get(2).map(|m| m.as_str()).unwrap_or("");
        let path = NAMESPACE_URI
            .captures(uri)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace('/', "."))
            .ok_or_else(|| ParseError::InvalidNamespaceDeclaration {
                declaration: whole.as_str().trim().to_string(),
            })?;
        log::debug!("registering namespace {alias} => {path} (xmlns)");
        ctx.resolver.register_namespace(&alias, &path);

        let (attr_start, attr_end) = (whole.start(), whole.end());
        let tag_start = result[..attr_start].rfind('<').unwrap_or(attr_start);
        let tag_end = result[attr_end..]
            .find('>')
            .map(|i| attr_end + i + 1)
            .unwrap_or(attr_end);
        let tag_text = result[tag_start..tag_end].to_string();

        if tag_text.contains(STRIP_MARKER) {
            result = strip_declaring_tag(result, tag_start, tag_end);
        } else {
            let blanked = blank_region(whole.as_str());
            result.replace_range(attr_start..attr_end, &blanked);
        }
    }
    Ok(result)
}

/// Blank an entire namespace-declaring tag and its matching closing tag
fn strip_declaring_tag(mut source: String, tag_start: usize, tag_end: usize) -> String {
    let tag_text = source[tag_start..tag_end].to_string();
    let tag_name: String = tag_text
        .trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let blanked = blank_region(&tag_text);
    source.replace_range(tag_start..tag_end, &blanked);

    if !tag_text.trim_end().ends_with("/>") && !tag_name.is_empty() {
        let close = format!("</{tag_name}>");
        if let Some(rel) = source[tag_end..].rfind(&close) {
            let close_start = tag_end + rel;
            let close_end = close_start + close.len();
            let blanked = blank_region(&close);
            source.replace_range(close_start..close_end, &blanked);
        }
    }
    source
}

fn validate_namespace_uses(source: &str, ctx: &ProcessingContext<'_>) -> ParseResult<()> {
    for capture in TAG_USE.captures_iter(source).chain(INLINE_USE.captures_iter(source)) {
        let alias = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        if !ctx.resolver.is_namespace_valid(alias) && !ctx.resolver.is_namespace_ignored(alias) {
            let fragment = capture
                .get(0)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(ParseError::UnknownNamespace {
                namespace: alias.to_string(),
                fragment,
            });
        }
    }
    Ok(())
}
