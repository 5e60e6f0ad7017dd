//! The compiled template form
//!
//! Compilation is a constant-folding pass over the syntax tree: static
//! escapes are applied, constant expressions are evaluated, helpers may
//! replace themselves with constants, and adjacent text runs merge. The
//! folded tree renders through the same evaluator as the interpreted one,
//! so compiled and interpreted output are byte-identical by construction.

use crate::ast::{
    BooleanExpression, BooleanOperand, BooleanToken, ExpressionNode, ExpressionOperand, RootNode,
    SyntaxNode,
};
use crate::model::{StandardVariableProvider, TemplateValue};
use crate::registry::{CompileResult, HelperResolver};
use crate::rendering::html_escape;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a template could not be compiled
#[derive(Debug, Error, Clone, PartialEq)]
#[error("template cannot be compiled: {reason}")]
pub struct CompilationFailure {
    /// What prevented compilation
    pub reason: String,
    /// Suggestions for making the template compilable
    pub mitigations: Vec<String>,
}

/// A compiled template: the folded tree plus everything needed to rebuild a
/// renderable template from a serialized artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledProgram {
    /// Cache identifier (source fingerprint)
    pub identifier: String,
    /// Folded body
    pub root: RootNode,
    /// Folded section bodies
    pub sections: IndexMap<String, Vec<SyntaxNode>>,
    /// Layout name node, unfolded
    pub layout: Option<SyntaxNode>,
}

impl CompiledProgram {
    /// Fold a parsed tree into its compiled form
    pub fn build(
        identifier: impl Into<String>,
        root: &RootNode,
        sections: impl Iterator<Item = (String, Vec<SyntaxNode>)>,
        layout: Option<SyntaxNode>,
        resolver: &HelperResolver,
    ) -> Result<Self, CompilationFailure> {
        let folded_root = RootNode::new(fold_nodes(&root.children, resolver)?);
        let mut folded_sections = IndexMap::new();
        for (name, nodes) in sections {
            folded_sections.insert(name, fold_nodes(&nodes, resolver)?);
        }
        Ok(Self {
            identifier: identifier.into(),
            root: folded_root,
            sections: folded_sections,
            layout,
        })
    }
}

fn fold_nodes(
    nodes: &[SyntaxNode],
    resolver: &HelperResolver,
) -> Result<Vec<SyntaxNode>, CompilationFailure> {
    let mut folded: Vec<SyntaxNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = fold_node(node, resolver)?;
        // Merge adjacent text runs
        if let SyntaxNode::Text(text) = &node
            && let Some(SyntaxNode::Text(previous)) = folded.last_mut()
        {
            previous.push_str(text);
            continue;
        }
        folded.push(node);
    }
    Ok(folded)
}

fn fold_node(
    node: &SyntaxNode,
    resolver: &HelperResolver,
) -> Result<SyntaxNode, CompilationFailure> {
    match node {
        SyntaxNode::Text(_) | SyntaxNode::Numeric(_) | SyntaxNode::ObjectAccessor(_) => {
            Ok(node.clone())
        }
        SyntaxNode::Root(root) => Ok(SyntaxNode::Root(RootNode::new(fold_nodes(
            &root.children,
            resolver,
        )?))),
        SyntaxNode::Array(entries) => {
            let mut folded = IndexMap::new();
            for (key, child) in entries {
                folded.insert(key.clone(), fold_node(child, resolver)?);
            }
            Ok(SyntaxNode::Array(folded))
        }
        SyntaxNode::Boolean(expression) => Ok(SyntaxNode::Boolean(expression.clone())),
        SyntaxNode::Expression(expression) => {
            if let Some(value) = constant_expression_value(expression) {
                Ok(constant_node(value))
            } else {
                Ok(node.clone())
            }
        }
        SyntaxNode::Escape(inner) => {
            let inner = fold_node(inner, resolver)?;
            match &inner {
                SyntaxNode::Text(text) => Ok(SyntaxNode::Text(html_escape(text))),
                SyntaxNode::Numeric(value) => {
                    Ok(SyntaxNode::Text(html_escape(&value.render_string())))
                }
                _ => Ok(SyntaxNode::Escape(Box::new(inner))),
            }
        }
        SyntaxNode::ViewHelper(helper_node) => {
            let helper = resolver
                .resolve(&helper_node.namespace, &helper_node.name)
                .map_err(|err| CompilationFailure {
                    reason: err.to_string(),
                    mitigations: Vec::new(),
                })?;
            match helper.compile(helper_node) {
                CompileResult::Replace(value) => Ok(constant_node(value)),
                CompileResult::Abort {
                    reason,
                    mitigations,
                } => Err(CompilationFailure {
                    reason,
                    mitigations,
                }),
                CompileResult::Continue => {
                    let mut folded = helper_node.clone();
                    let mut arguments = IndexMap::new();
                    for (name, argument) in &folded.arguments {
                        arguments.insert(name.clone(), fold_node(argument, resolver)?);
                    }
                    folded.arguments = arguments;
                    folded.children = fold_nodes(&folded.children, resolver)?;
                    Ok(SyntaxNode::ViewHelper(folded))
                }
            }
        }
    }
}

fn constant_node(value: TemplateValue) -> SyntaxNode {
    match value {
        TemplateValue::String(s) => SyntaxNode::Text(s),
        TemplateValue::Null => SyntaxNode::Text(String::new()),
        other => SyntaxNode::Numeric(other),
    }
}

/// Evaluate an expression at compile time when every operand is a literal
fn constant_expression_value(expression: &ExpressionNode) -> Option<TemplateValue> {
    let literal = |operand: &ExpressionOperand| matches!(operand, ExpressionOperand::Literal(_));
    let constant = match expression {
        ExpressionNode::Ternary {
            condition,
            then,
            otherwise,
        } => boolean_is_constant(condition) && literal(then) && literal(otherwise),
        ExpressionNode::Math { first, rest } => {
            literal(first) && rest.iter().all(|(_, operand)| literal(operand))
        }
        ExpressionNode::Cast { value, .. } => literal(value),
        ExpressionNode::NullCoalescing { operands } => operands.iter().all(literal),
    };
    if constant {
        Some(expression.evaluate(&StandardVariableProvider::new()))
    } else {
        None
    }
}

fn boolean_is_constant(expression: &BooleanExpression) -> bool {
    expression.tokens().iter().all(|token| {
        !matches!(
            token,
            BooleanToken::Operand(BooleanOperand::Accessor(_))
                | BooleanToken::Operand(BooleanOperand::Node(_))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fold(nodes: Vec<SyntaxNode>) -> Vec<SyntaxNode> {
        fold_nodes(&nodes, &HelperResolver::standard()).expect("foldable")
    }

    #[test]
    fn adjacent_text_runs_merge() {
        let folded = fold(vec![SyntaxNode::text("a"), SyntaxNode::text("b")]);
        assert_eq!(folded, vec![SyntaxNode::text("ab")]);
    }

    #[test]
    fn static_escapes_are_applied_at_compile_time() {
        let folded = fold(vec![SyntaxNode::Escape(Box::new(SyntaxNode::text("<b>")))]);
        assert_eq!(folded, vec![SyntaxNode::text("&lt;b&gt;")]);
    }

    #[test]
    fn constant_math_folds_to_its_value() {
        let expression = ExpressionNode::Math {
            first: ExpressionOperand::Literal(TemplateValue::Integer(1)),
            rest: vec![(
                crate::ast::MathOperator::Add,
                ExpressionOperand::Literal(TemplateValue::Integer(2)),
            )],
        };
        let folded = fold(vec![SyntaxNode::Expression(expression)]);
        assert_eq!(folded, vec![SyntaxNode::Numeric(TemplateValue::Integer(3))]);
    }

    #[test]
    fn accessor_expressions_stay_dynamic() {
        let expression = ExpressionNode::Math {
            first: ExpressionOperand::Accessor("a".into()),
            rest: vec![(
                crate::ast::MathOperator::Add,
                ExpressionOperand::Literal(TemplateValue::Integer(2)),
            )],
        };
        let folded = fold(vec![SyntaxNode::Expression(expression.clone())]);
        assert_eq!(folded, vec![SyntaxNode::Expression(expression)]);
    }

    #[test]
    fn comment_helpers_fold_away() {
        let node = SyntaxNode::ViewHelper(crate::ast::ViewHelperNode {
            namespace: "f".into(),
            name: "comment".into(),
            arguments: IndexMap::new(),
            children: vec![SyntaxNode::text("gone")],
        });
        let folded = fold(vec![SyntaxNode::text("a"), node, SyntaxNode::text("b")]);
        assert_eq!(folded, vec![SyntaxNode::text("ab")]);
    }

    #[test]
    fn serialized_program_round_trips() {
        let program = CompiledProgram {
            identifier: "tpl_test".into(),
            root: RootNode::new(vec![
                SyntaxNode::text("hi "),
                SyntaxNode::ObjectAccessor("name".into()),
            ]),
            sections: IndexMap::new(),
            layout: None,
        };
        let json = serde_json::to_string(&program).expect("serialize");
        let restored: CompiledProgram = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, program);
    }
}
