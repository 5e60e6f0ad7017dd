//! Parsing-mode and escaping directives

use super::{ProcessingContext, TemplateProcessor};
use crate::parser::error::{ParseError, ParseResult};
use once_cell::sync::Lazy;
use regex::Regex;

// `[ \t]` rather than `\s`: directives never span lines, which is what
// makes plain removal safe for line numbers
static PARSING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{parsing[ \t]+(on|off)\}").expect("parsing pattern is valid"));

static ESCAPING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:escaping|escapingEnabled)[ \t]*=?[ \t]*(on|off|true|false)[ \t]*\}")
        .expect("escaping pattern is valid")
});

/// Detects `{parsing off}`
///
/// Found anywhere in the source, it aborts structural parsing entirely: the
/// marker-stripped source is the render result. `{parsing on}` merely strips
/// the marker and parsing continues.
pub struct PassthroughProcessor;

impl TemplateProcessor for PassthroughProcessor {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn pre_process(&self, source: String, ctx: &mut ProcessingContext<'_>) -> ParseResult<String> {
        if !PARSING_PATTERN.is_match(&source) {
            return Ok(source);
        }
        let mut disabled = false;
        for capture in PARSING_PATTERN.captures_iter(&source) {
            if capture.get(1).map(|m| m.as_str()) == Some("off") {
                disabled = true;
            }
        }
        let stripped = PARSING_PATTERN.replace_all(&source, "").into_owned();
        if disabled {
            log::debug!("template requested passthrough mode, structural parsing skipped");
            ctx.passthrough = true;
        }
        Ok(stripped)
    }
}

/// Detects the one-time `{escaping on|off}` directive
///
/// Using the directive more than once in a single template is an error. The
/// directive cannot span lines, so removing it keeps line numbers stable.
pub struct EscapingDirectiveProcessor;

impl TemplateProcessor for EscapingDirectiveProcessor {
    fn name(&self) -> &'static str {
        "escaping-directive"
    }

    fn pre_process(&self, source: String, ctx: &mut ProcessingContext<'_>) -> ParseResult<String> {
        let matches: Vec<_> = ESCAPING_PATTERN.captures_iter(&source).collect();
        match matches.len() {
            0 => Ok(source),
            1 => {
                let capture = &matches[0];
                let enabled = matches!(
                    capture.get(1).map(|m| m.as_str()),
                    Some("on") | Some("true")
                );
                ctx.escaping = Some(enabled);
                let whole = capture.get(0).expect("capture 0 always present");
                let mut result = String::with_capacity(source.len());
                result.push_str(&source[..whole.start()]);
                result.push_str(&source[whole.end()..]);
                Ok(result)
            }
            _ => Err(ParseError::DuplicateEscapingDirective),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HelperResolver;

    fn run(processor: &dyn TemplateProcessor, source: &str) -> (ParseResult<String>, bool, Option<bool>) {
        let resolver = HelperResolver::standard();
        let mut ctx = ProcessingContext::new(&resolver);
        let result = processor.pre_process(source.to_string(), &mut ctx);
        (result, ctx.passthrough, ctx.escaping)
    }

    #[test]
    fn parsing_off_enables_passthrough_and_strips_markers() {
        let (result, passthrough, _) = run(&PassthroughProcessor, "a {parsing off} b");
        assert_eq!(result.unwrap(), "a  b");
        assert!(passthrough);
    }

    #[test]
    fn parsing_on_only_strips_the_marker() {
        let (result, passthrough, _) = run(&PassthroughProcessor, "{parsing on}<b>{x}</b>");
        assert_eq!(result.unwrap(), "<b>{x}</b>");
        assert!(!passthrough);
    }

    #[test]
    fn escaping_directive_is_recorded_and_removed() {
        let (result, _, escaping) = run(&EscapingDirectiveProcessor, "{escaping off}\nHello");
        assert_eq!(result.unwrap(), "\nHello");
        assert_eq!(escaping, Some(false));
    }

    #[test]
    fn directives_never_span_lines() {
        let source = "{escaping\noff}";
        let (result, _, escaping) = run(&EscapingDirectiveProcessor, source);
        assert_eq!(result.unwrap(), source);
        assert_eq!(escaping, None);
    }

    #[test]
    fn duplicate_escaping_directive_is_an_error() {
        let (result, _, _) = run(
            &EscapingDirectiveProcessor,
            "{escaping off} x {escaping on}",
        );
        assert_eq!(result, Err(ParseError::DuplicateEscapingDirective));
    }
}
