//! Render error types

use crate::parser::ParseError;
use crate::registry::HelperError;
use thiserror::Error;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while rendering a parsed template
#[derive(Debug, Error)]
pub enum RenderError {
    /// A helper invocation failed
    #[error(transparent)]
    Helper(#[from] HelperError),

    /// Nested rendering (partials, layouts, recursive helpers) went too deep
    #[error("render recursion limit of {limit} exceeded")]
    RecursionLimit {
        /// The configured limit
        limit: usize,
    },

    /// A section was requested that no template defined
    #[error("section '{name}' is not defined")]
    SectionNotFound {
        /// Section name as requested
        name: String,
    },

    /// A template, partial or layout could not be located
    #[error("template '{name}' could not be found")]
    TemplateNotFound {
        /// Template name as requested
        name: String,
    },

    /// A partial or layout loaded at render time failed to parse
    #[error(transparent)]
    Parse(#[from] ParseError),
}
