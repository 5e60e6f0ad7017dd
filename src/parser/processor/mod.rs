//! Source-to-source transforms run before structural parsing
//!
//! Processors are ordered and composable. Every pass preserves the source's
//! line count: multi-line regions (CDATA, comments) are blanked with
//! whitespace, single-line directives are removed outright. Error messages
//! reported later therefore still point at the right lines. The passthrough
//! processor can stop the whole pipeline and hand the remaining source back
//! verbatim.

mod comments;
mod directives;
mod namespaces;

pub use comments::{CdataProcessor, CommentProcessor};
pub use directives::{EscapingDirectiveProcessor, PassthroughProcessor};
pub use namespaces::NamespaceDetectionProcessor;

use super::error::ParseResult;
use crate::registry::HelperResolver;

/// Shared state for one pre-processing run
pub struct ProcessingContext<'a> {
    /// Resolver the namespace processor registers declarations with
    pub resolver: &'a HelperResolver,
    /// Escaping directive value, once seen
    pub escaping: Option<bool>,
    /// Set when `{parsing off}` was found; structural parsing is skipped
    pub passthrough: bool,
}

impl<'a> ProcessingContext<'a> {
    /// Create a context for the given resolver
    pub fn new(resolver: &'a HelperResolver) -> Self {
        Self {
            resolver,
            escaping: None,
            passthrough: false,
        }
    }
}

/// One stage of the pre-processing pipeline
pub trait TemplateProcessor: Send + Sync {
    /// Processor name for logging
    fn name(&self) -> &'static str;

    /// Transform the source; may record findings on the context
    fn pre_process(&self, source: String, ctx: &mut ProcessingContext<'_>) -> ParseResult<String>;
}

/// The standard pipeline in its required order
pub fn standard_processors() -> Vec<Box<dyn TemplateProcessor>> {
    vec![
        Box::new(PassthroughProcessor),
        Box::new(CdataProcessor),
        Box::new(CommentProcessor),
        Box::new(EscapingDirectiveProcessor),
        Box::new(NamespaceDetectionProcessor),
    ]
}

/// Replace a source region with whitespace, keeping newlines so the line
/// count (and downstream line numbers) survive
pub(crate) fn blank_region(region: &str) -> String {
    region
        .chars()
        .map(|c| if c == '\n' { '\n' } else { ' ' })
        .collect()
}
