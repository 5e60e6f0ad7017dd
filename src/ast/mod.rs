//! Abstract syntax tree for parsed templates
//!
//! The node model is a closed enum dispatched by pattern matching. Nodes are
//! immutable once constructed and carry no rendering state; the rendering
//! context is always passed as a parameter to evaluation, so a parsed tree
//! can be shared read-only between concurrent render passes.

mod boolean;
mod expression;
mod node;

pub use boolean::{BooleanExpression, BooleanOperand, BooleanToken, ComparisonOperator};
pub use expression::{
    CastTarget, ExpressionNode, ExpressionOperand, MathOperator, split_expression_parts,
};
pub use node::{RootNode, SyntaxNode, ViewHelperNode};
