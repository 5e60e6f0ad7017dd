//! Syntax tree node variants

use super::boolean::BooleanExpression;
use super::expression::ExpressionNode;
use crate::model::TemplateValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single node of the template syntax tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyntaxNode {
    /// Ordered sequence of children; evaluates to their concatenated output
    Root(RootNode),
    /// Literal text
    Text(String),
    /// Literal number (integer or float)
    Numeric(TemplateValue),
    /// Boolean sub-expression (comparison chain)
    Boolean(BooleanExpression),
    /// Ordered, keyed collection of child nodes
    Array(IndexMap<String, SyntaxNode>),
    /// Dotted-path variable reference, resolved at evaluation time
    ObjectAccessor(String),
    /// Helper tag invocation
    ViewHelper(ViewHelperNode),
    /// Shorthand expression (ternary, math, cast, null-coalescing)
    Expression(ExpressionNode),
    /// HTML-escapes the evaluated string form of its inner node
    Escape(Box<SyntaxNode>),
}

impl SyntaxNode {
    /// Literal text node
    pub fn text(s: impl Into<String>) -> Self {
        SyntaxNode::Text(s.into())
    }

    /// The statically known string form of this node, if it has one
    ///
    /// Used where a value must be known at parse time, e.g. section names
    /// and the constant-folding pass of the compiler.
    pub fn static_text(&self) -> Option<&str> {
        match self {
            SyntaxNode::Text(s) => Some(s),
            SyntaxNode::Root(root) if root.children.len() == 1 => root.children[0].static_text(),
            _ => None,
        }
    }
}

/// Ordered sequence of sibling nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RootNode {
    /// Children in source order; evaluation is strictly front-to-back
    pub children: Vec<SyntaxNode>,
}

impl RootNode {
    /// Create a root over the given children
    pub fn new(children: Vec<SyntaxNode>) -> Self {
        Self { children }
    }
}

/// Invocation of a registered helper
///
/// Holds the resolved namespace and helper name, the argument map (keys
/// unique, values fully-formed sub-trees) and the tag body children. Whether
/// children are evaluated eagerly or lazily is the invoked helper's call,
/// made through the render-children closure it receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewHelperNode {
    /// Namespace alias the tag was written with (e.g. `f`)
    pub namespace: String,
    /// Helper name, possibly hierarchical (e.g. `format.raw`)
    pub name: String,
    /// Argument name to sub-tree mapping
    pub arguments: IndexMap<String, SyntaxNode>,
    /// Tag body content
    pub children: Vec<SyntaxNode>,
}

impl ViewHelperNode {
    /// Fully qualified `namespace:name` form, used in error messages
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }
}
