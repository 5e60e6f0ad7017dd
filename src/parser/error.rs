//! Parse error types

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised while pre-processing or structurally parsing a template
///
/// Parsing is all-or-nothing: no partial tree is ever returned alongside one
/// of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An opening tag was never closed
    #[error("Unclosed tag <{tag}> opened on line {line}")]
    UnclosedTag {
        /// Qualified tag name
        tag: String,
        /// Line the tag was opened on (1-based)
        line: usize,
    },

    /// A closing tag does not match the innermost open tag
    #[error("Closing tag </{found}> on line {line} does not match open tag <{expected}>")]
    MismatchedClosingTag {
        /// Tag that is currently open
        expected: String,
        /// Closing tag encountered
        found: String,
        /// Line of the closing tag (1-based)
        line: usize,
    },

    /// A closing tag appeared with no tag open at all
    #[error("Closing tag </{found}> on line {line} has no matching open tag")]
    UnexpectedClosingTag {
        /// Closing tag encountered
        found: String,
        /// Line of the closing tag (1-based)
        line: usize,
    },

    /// Tag attributes could not be parsed
    #[error("Malformed attributes in tag <{tag}>: {detail}")]
    MalformedAttributes {
        /// Qualified tag name
        tag: String,
        /// What went wrong
        detail: String,
    },

    /// A namespace alias is used but neither registered nor ignored
    #[error("Unknown namespace '{namespace}' in fragment '{fragment}'")]
    UnknownNamespace {
        /// Offending alias
        namespace: String,
        /// Source fragment containing the use
        fragment: String,
    },

    /// A namespace is valid but the helper name has no implementation
    #[error("Helper '{namespace}:{name}' could not be resolved")]
    UnresolvableHelper {
        /// Namespace alias
        namespace: String,
        /// Helper name
        name: String,
    },

    /// The escaping directive may appear at most once per template
    #[error("The escaping directive may only be used once per template")]
    DuplicateEscapingDirective,

    /// Duplicate argument on a tag
    #[error("Argument '{argument}' given more than once on tag <{tag}>")]
    DuplicateArgument {
        /// Argument name
        argument: String,
        /// Qualified tag name
        tag: String,
    },

    /// Invalid namespace declaration syntax
    #[error("Invalid namespace declaration: {declaration}")]
    InvalidNamespaceDeclaration {
        /// The declaration as written
        declaration: String,
    },
}
