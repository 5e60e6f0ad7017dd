//! Automatic output escaping

use super::{InterceptionPoint, Interceptor};
use crate::ast::SyntaxNode;
use crate::parser::state::ParsingState;
use crate::registry::HelperResolver;
use std::sync::Arc;

/// Wraps object accessors in escape nodes while auto-escaping is active
///
/// A helper that declares its children must not be auto-escaped disables the
/// interceptor when it opens; the disable is stacked so nested disabling
/// helpers re-enable escaping only once the outermost of them closes. A
/// helper that declares its own output must be escaped gets wrapped as a
/// whole when it closes.
pub struct EscapeInterceptor {
    resolver: Arc<HelperResolver>,
    disabled_by: Vec<usize>,
}

impl EscapeInterceptor {
    /// Create a fresh interceptor for one parse
    pub fn new(resolver: Arc<HelperResolver>) -> Self {
        Self {
            resolver,
            disabled_by: Vec::new(),
        }
    }

    fn active(&self, state: &ParsingState) -> bool {
        state.escaping_enabled && self.disabled_by.is_empty()
    }
}

impl Interceptor for EscapeInterceptor {
    fn intercepts(&self, point: InterceptionPoint) -> bool {
        matches!(
            point,
            InterceptionPoint::OpeningHelper
                | InterceptionPoint::ClosingHelper
                | InterceptionPoint::ObjectAccessor
        )
    }

    fn process(
        &mut self,
        node: SyntaxNode,
        point: InterceptionPoint,
        state: &ParsingState,
    ) -> SyntaxNode {
        match point {
            InterceptionPoint::OpeningHelper => {
                if let SyntaxNode::ViewHelper(helper_node) = &node
                    && let Ok(helper) = self
                        .resolver
                        .resolve(&helper_node.namespace, &helper_node.name)
                    && !helper.escapes_children()
                {
                    self.disabled_by.push(state.stack_depth);
                }
                node
            }
            InterceptionPoint::ClosingHelper => {
                let mut escape_output = false;
                if let SyntaxNode::ViewHelper(helper_node) = &node
                    && let Ok(helper) = self
                        .resolver
                        .resolve(&helper_node.namespace, &helper_node.name)
                {
                    if !helper.escapes_children()
                        && self.disabled_by.last() == Some(&state.stack_depth)
                    {
                        self.disabled_by.pop();
                    }
                    escape_output = helper.escapes_output();
                }
                if escape_output && self.active(state) {
                    SyntaxNode::Escape(Box::new(node))
                } else {
                    node
                }
            }
            InterceptionPoint::ObjectAccessor => {
                if self.active(state) {
                    SyntaxNode::Escape(Box::new(node))
                } else {
                    node
                }
            }
            InterceptionPoint::Text => node,
        }
    }
}
