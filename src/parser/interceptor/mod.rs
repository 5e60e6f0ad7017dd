//! Parse-time tree rewriting hooks
//!
//! Interceptors run at defined points while the parser builds the tree and
//! may replace the node they are handed. They are constructed fresh for
//! every parse, so internal bookkeeping (like the escape interceptor's
//! disable stack) never leaks between templates.

mod escape;
mod resource;

pub use escape::EscapeInterceptor;
pub use resource::ResourceInterceptor;

use super::state::ParsingState;
use crate::ast::SyntaxNode;

/// When during parsing an interceptor may act
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptionPoint {
    /// A literal text node was created
    Text,
    /// A helper tag was opened (node has arguments, no children yet)
    OpeningHelper,
    /// A helper tag was closed (node is complete)
    ClosingHelper,
    /// An object accessor node was created
    ObjectAccessor,
}

/// A parse-time node rewriter
pub trait Interceptor {
    /// Whether this interceptor wants to act at the given point
    fn intercepts(&self, point: InterceptionPoint) -> bool;

    /// Rewrite (or pass through) the node
    ///
    /// Must not mutate parsing state beyond documented internal bookkeeping;
    /// multi-node replacements are returned as a `Root` wrapper.
    fn process(
        &mut self,
        node: SyntaxNode,
        point: InterceptionPoint,
        state: &ParsingState,
    ) -> SyntaxNode;
}
