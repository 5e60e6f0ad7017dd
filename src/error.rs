//! Crate-level error type

use crate::parser::ParseError;
use crate::rendering::RenderError;
use thiserror::Error;

/// Result type for engine-level operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Any failure between template source and rendered output
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The template parsed but failed to render
    #[error(transparent)]
    Render(#[from] RenderError),
}
