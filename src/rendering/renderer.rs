//! Tree evaluation

use super::context::RenderingContext;
use super::error::{RenderError, RenderResult};
use crate::ast::{BooleanOperand, SyntaxNode};
use crate::model::TemplateValue;
use crate::registry::bind_arguments;
use indexmap::IndexMap;

/// The children of a helper node, rendered lazily and possibly repeatedly
///
/// Helpers decide if and how often their body renders; loop helpers call
/// `render` once per iteration with a different variable scope each time.
pub struct ChildBlock<'a> {
    nodes: &'a [SyntaxNode],
}

impl<'a> ChildBlock<'a> {
    pub fn new(nodes: &'a [SyntaxNode]) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SyntaxNode] {
        self.nodes
    }

    /// Render the block; a single child keeps its value type, multiple
    /// children concatenate to a string
    pub fn render(&self, ctx: &mut RenderingContext) -> RenderResult<TemplateValue> {
        render_nodes(self.nodes, ctx)
    }
}

/// Render a node list with the single-child type-preservation rule
pub fn render_nodes(nodes: &[SyntaxNode], ctx: &mut RenderingContext) -> RenderResult<TemplateValue> {
    match nodes {
        [] => Ok(TemplateValue::Null),
        [single] => evaluate(single, ctx),
        many => {
            let mut output = String::new();
            for node in many {
                output.push_str(&evaluate(node, ctx)?.render_string());
            }
            Ok(TemplateValue::String(output))
        }
    }
}

/// Evaluate one node against the rendering context
pub fn evaluate(node: &SyntaxNode, ctx: &mut RenderingContext) -> RenderResult<TemplateValue> {
    match node {
        SyntaxNode::Root(root) => render_nodes(&root.children, ctx),
        SyntaxNode::Text(text) => Ok(TemplateValue::String(text.clone())),
        SyntaxNode::Numeric(value) => Ok(value.clone()),
        SyntaxNode::ObjectAccessor(path) => Ok(ctx.lookup(path)),
        SyntaxNode::Array(entries) => {
            let mut object = IndexMap::new();
            for (key, child) in entries {
                object.insert(key.clone(), evaluate(child, ctx)?);
            }
            Ok(TemplateValue::Object(object))
        }
        SyntaxNode::Boolean(expression) => {
            let mut resolve = |operand: &BooleanOperand| -> RenderResult<TemplateValue> {
                match operand {
                    BooleanOperand::Literal(value) => Ok(value.clone()),
                    BooleanOperand::Accessor(path) => Ok(ctx.lookup(path)),
                    BooleanOperand::Node(node) => evaluate(node, ctx),
                }
            };
            Ok(TemplateValue::Boolean(
                expression.evaluate_with(&mut resolve)?,
            ))
        }
        SyntaxNode::Expression(expression) => Ok(expression.evaluate(ctx.variables())),
        SyntaxNode::Escape(inner) => {
            let value = evaluate(inner, ctx)?;
            Ok(TemplateValue::String(html_escape(&value.render_string())))
        }
        SyntaxNode::ViewHelper(node) => {
            let helper = ctx.resolver().resolve(&node.namespace, &node.name)?;
            let qualified = node.qualified_name();

            let mut values = IndexMap::new();
            for (name, argument) in &node.arguments {
                values.insert(name.clone(), evaluate(argument, ctx)?);
            }
            let arguments =
                bind_arguments(helper.as_ref(), &qualified, values).map_err(RenderError::from)?;

            ctx.enter()?;
            let children = ChildBlock::new(&node.children);
            let result = helper.render(&arguments, &children, ctx);
            ctx.leave();
            result
        }
    }
}

/// Escape HTML metacharacters, quotes included
pub fn html_escape(input: &str) -> String {
    html_escape_with(input, true)
}

/// Escape `&`, `<` and `>`, plus both quote characters when requested
pub fn html_escape_with(input: &str, escape_quotes: bool) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if escape_quotes => escaped.push_str("&quot;"),
            '\'' if escape_quotes => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HelperResolver;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    fn context_with(vars: &[(&str, TemplateValue)]) -> RenderingContext {
        let mut map = FxHashMap::default();
        for (name, value) in vars {
            map.insert(name.to_string(), value.clone());
        }
        RenderingContext::with_variables(Arc::new(HelperResolver::standard()), map)
    }

    #[test]
    fn escape_node_escapes_the_rendered_string() {
        let mut ctx = context_with(&[(
            "name",
            TemplateValue::from("<script>alert(1)</script>"),
        )]);
        let node = SyntaxNode::Escape(Box::new(SyntaxNode::ObjectAccessor("name".into())));
        assert_eq!(
            evaluate(&node, &mut ctx).expect("render"),
            TemplateValue::from("&lt;script&gt;alert(1)&lt;/script&gt;")
        );
    }

    #[test]
    fn missing_accessor_renders_as_null() {
        let mut ctx = context_with(&[]);
        let node = SyntaxNode::ObjectAccessor("missing.path".into());
        assert_eq!(
            evaluate(&node, &mut ctx).expect("render"),
            TemplateValue::Null
        );
    }

    #[test]
    fn single_child_blocks_preserve_the_value_type() {
        let mut ctx = context_with(&[("n", TemplateValue::Integer(5))]);
        let nodes = [SyntaxNode::ObjectAccessor("n".into())];
        assert_eq!(
            ChildBlock::new(&nodes).render(&mut ctx).expect("render"),
            TemplateValue::Integer(5)
        );
    }

    #[test]
    fn html_escape_handles_quotes_selectively() {
        assert_eq!(html_escape_with("a\"b'c", true), "a&quot;b&#039;c");
        assert_eq!(html_escape_with("a\"b'c", false), "a\"b'c");
        assert_eq!(html_escape("x < y & z"), "x &lt; y &amp; z");
    }
}
