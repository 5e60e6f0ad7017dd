//! Template parsing: pre-processing, segment scanning and tree construction
//!
//! Parsing runs in three stages. Processors rewrite the raw source (blanking
//! comments, extracting namespace declarations), the scanner splits it into
//! text, tag and shorthand segments, and the structural parser folds the
//! segments into a syntax tree while interceptors rewrite nodes in flight.

pub mod error;
pub mod interceptor;
pub mod processor;
pub mod scanner;
mod state;
mod template_parser;

pub use error::{ParseError, ParseResult};
pub use state::ParsingState;
pub use template_parser::TemplateParser;
