//! Boolean comparison chains and their stack-based evaluator
//!
//! Conditions such as `a == b && !c` are tokenized into an operand/operator
//! sequence and evaluated with an explicit value/operator stack. Operands may
//! be literals, accessors, or arbitrary sub-trees (when a helper argument
//! declared as boolean carries nested markup).

use super::expression::{ExpressionOperand, split_expression_parts};
use super::node::SyntaxNode;
use crate::model::{TemplateValue, VariableProvider};
use serde::{Deserialize, Serialize};

/// Binary comparison operator inside a boolean chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<=`
    LessThanOrEqual,
    /// `%` — remainder, truthy when non-zero
    Modulo,
}

impl ComparisonOperator {
    fn parse(part: &str) -> Option<ComparisonOperator> {
        match part {
            "==" => Some(ComparisonOperator::Equal),
            "!=" => Some(ComparisonOperator::NotEqual),
            ">" => Some(ComparisonOperator::GreaterThan),
            "<" => Some(ComparisonOperator::LessThan),
            ">=" => Some(ComparisonOperator::GreaterThanOrEqual),
            "<=" => Some(ComparisonOperator::LessThanOrEqual),
            "%" => Some(ComparisonOperator::Modulo),
            _ => None,
        }
    }

    fn apply(self, left: &TemplateValue, right: &TemplateValue) -> TemplateValue {
        use std::cmp::Ordering;
        let result = match self {
            ComparisonOperator::Equal => left.loose_equals(right),
            ComparisonOperator::NotEqual => !left.loose_equals(right),
            ComparisonOperator::GreaterThan => {
                left.loose_cmp(right) == Some(Ordering::Greater)
            }
            ComparisonOperator::LessThan => left.loose_cmp(right) == Some(Ordering::Less),
            ComparisonOperator::GreaterThanOrEqual => matches!(
                left.loose_cmp(right),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            ComparisonOperator::LessThanOrEqual => matches!(
                left.loose_cmp(right),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            ComparisonOperator::Modulo => {
                let a = left.as_number().unwrap_or(0.0);
                let b = right.as_number().unwrap_or(0.0);
                b != 0.0 && a % b != 0.0
            }
        };
        TemplateValue::Boolean(result)
    }
}

/// A single operand of a boolean chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BooleanOperand {
    /// Literal value
    Literal(TemplateValue),
    /// Dotted-path variable reference
    Accessor(String),
    /// Arbitrary sub-tree, resolved by the renderer
    Node(Box<SyntaxNode>),
}

/// One token of the tokenized chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BooleanToken {
    /// Operand
    Operand(BooleanOperand),
    /// `!` applied to the next operand
    Not,
    /// `&&`
    And,
    /// `||`
    Or,
    /// Comparison operator
    Compare(ComparisonOperator),
}

/// Tokenized boolean expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanExpression {
    tokens: Vec<BooleanToken>,
}

// Operator precedence: comparisons bind tighter than `&&`, `&&` tighter
// than `||`. `!` attaches directly to the operand it precedes.
fn precedence(token: &BooleanToken) -> u8 {
    match token {
        BooleanToken::Compare(_) => 3,
        BooleanToken::And => 2,
        BooleanToken::Or => 1,
        _ => 0,
    }
}

impl BooleanExpression {
    /// Build from pre-tokenized tokens
    pub fn new(tokens: Vec<BooleanToken>) -> Self {
        Self { tokens }
    }

    /// The token chain, in evaluation order
    pub fn tokens(&self) -> &[BooleanToken] {
        &self.tokens
    }

    /// Build from whitespace-split expression parts
    ///
    /// Returns `None` when any part is neither an operator nor a parseable
    /// operand, so callers can fall back to other interpretations.
    pub fn from_parts(parts: &[String]) -> Option<BooleanExpression> {
        let mut tokens = Vec::with_capacity(parts.len());
        for part in parts {
            let mut part = part.as_str();
            match part {
                "&&" => {
                    tokens.push(BooleanToken::And);
                    continue;
                }
                "||" => {
                    tokens.push(BooleanToken::Or);
                    continue;
                }
                "!" => {
                    tokens.push(BooleanToken::Not);
                    continue;
                }
                _ => {}
            }
            if let Some(op) = ComparisonOperator::parse(part) {
                tokens.push(BooleanToken::Compare(op));
                continue;
            }
            while let Some(stripped) = part.strip_prefix('!') {
                tokens.push(BooleanToken::Not);
                part = stripped;
            }
            let operand = ExpressionOperand::parse(part)?;
            tokens.push(BooleanToken::Operand(match operand {
                ExpressionOperand::Literal(v) => BooleanOperand::Literal(v),
                ExpressionOperand::Accessor(p) => BooleanOperand::Accessor(p),
            }));
        }
        if tokens.is_empty() {
            return None;
        }
        Some(Self { tokens })
    }

    /// Build from parsed sibling nodes of a boolean-typed helper argument
    ///
    /// Text fragments are tokenized; accessors and literals become operands
    /// directly; anything else stays a sub-tree resolved at render time.
    pub fn from_nodes(nodes: &[SyntaxNode]) -> BooleanExpression {
        let mut tokens = Vec::new();
        for node in nodes {
            match node {
                SyntaxNode::Text(text) => {
                    for part in split_expression_parts(text) {
                        match part.as_str() {
                            "&&" => tokens.push(BooleanToken::And),
                            "||" => tokens.push(BooleanToken::Or),
                            "!" => tokens.push(BooleanToken::Not),
                            other => {
                                if let Some(op) = ComparisonOperator::parse(other) {
                                    tokens.push(BooleanToken::Compare(op));
                                } else {
                                    let mut rest = other;
                                    while let Some(stripped) = rest.strip_prefix('!') {
                                        tokens.push(BooleanToken::Not);
                                        rest = stripped;
                                    }
                                    let operand = match ExpressionOperand::parse(rest) {
                                        Some(ExpressionOperand::Literal(v)) => {
                                            BooleanOperand::Literal(v)
                                        }
                                        Some(ExpressionOperand::Accessor(p)) => {
                                            BooleanOperand::Accessor(p)
                                        }
                                        None => BooleanOperand::Literal(TemplateValue::String(
                                            rest.to_string(),
                                        )),
                                    };
                                    tokens.push(BooleanToken::Operand(operand));
                                }
                            }
                        }
                    }
                }
                SyntaxNode::ObjectAccessor(path) => {
                    tokens.push(BooleanToken::Operand(BooleanOperand::Accessor(path.clone())));
                }
                SyntaxNode::Numeric(value) => {
                    tokens.push(BooleanToken::Operand(BooleanOperand::Literal(value.clone())));
                }
                SyntaxNode::Boolean(inner) => tokens.extend(inner.tokens.iter().cloned()),
                other => tokens.push(BooleanToken::Operand(BooleanOperand::Node(Box::new(
                    other.clone(),
                )))),
            }
        }
        Self { tokens }
    }

    /// Evaluate with a custom operand resolver
    ///
    /// The resolver handles `Node` operands; the renderer passes a closure
    /// that runs full node evaluation.
    pub fn evaluate_with<E>(
        &self,
        resolve: &mut dyn FnMut(&BooleanOperand) -> Result<TemplateValue, E>,
    ) -> Result<bool, E> {
        let mut values: Vec<TemplateValue> = Vec::new();
        let mut operators: Vec<BooleanToken> = Vec::new();
        let mut pending_not = false;

        for token in &self.tokens {
            match token {
                BooleanToken::Operand(operand) => {
                    let mut value = resolve(operand)?;
                    if pending_not {
                        value = TemplateValue::Boolean(!value.is_truthy());
                        pending_not = false;
                    }
                    values.push(value);
                }
                BooleanToken::Not => pending_not = !pending_not,
                binary => {
                    while let Some(top) = operators.last() {
                        if precedence(top) >= precedence(binary) {
                            let top = operators.pop().unwrap_or(BooleanToken::And);
                            apply_operator(&top, &mut values);
                        } else {
                            break;
                        }
                    }
                    operators.push(binary.clone());
                }
            }
        }
        while let Some(op) = operators.pop() {
            apply_operator(&op, &mut values);
        }
        Ok(values.pop().map(|v| v.is_truthy()).unwrap_or(false))
    }

    /// Evaluate against a variable provider; sub-tree operands resolve to
    /// `Null` (they require a renderer)
    pub fn evaluate(&self, variables: &dyn VariableProvider) -> bool {
        let mut resolve = |operand: &BooleanOperand| -> Result<TemplateValue, ()> {
            Ok(match operand {
                BooleanOperand::Literal(value) => value.clone(),
                BooleanOperand::Accessor(path) => variables.get_by_path(path),
                BooleanOperand::Node(_) => TemplateValue::Null,
            })
        };
        self.evaluate_with(&mut resolve).unwrap_or(false)
    }
}

fn apply_operator(op: &BooleanToken, values: &mut Vec<TemplateValue>) {
    let right = values.pop().unwrap_or(TemplateValue::Null);
    let left = values.pop().unwrap_or(TemplateValue::Null);
    let result = match op {
        BooleanToken::Compare(cmp) => cmp.apply(&left, &right),
        BooleanToken::And => TemplateValue::Boolean(left.is_truthy() && right.is_truthy()),
        BooleanToken::Or => TemplateValue::Boolean(left.is_truthy() || right.is_truthy()),
        _ => TemplateValue::Null,
    };
    values.push(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StandardVariableProvider;
    use rstest::rstest;

    fn variables() -> StandardVariableProvider {
        let provider = StandardVariableProvider::new();
        provider.assign("four", TemplateValue::Integer(4));
        provider.assign("two", TemplateValue::Integer(2));
        provider.assign("name", TemplateValue::from("Ada"));
        provider
    }

    fn eval(expr: &str) -> bool {
        let parts = split_expression_parts(expr);
        BooleanExpression::from_parts(&parts)
            .unwrap_or_else(|| panic!("unparseable condition {expr:?}"))
            .evaluate(&variables())
    }

    #[rstest]
    #[case("four > two", true)]
    #[case("four < two", false)]
    #[case("four >= 4", true)]
    #[case("two <= 1", false)]
    #[case("name == 'Ada'", true)]
    #[case("name != 'Ada'", false)]
    #[case("four == '4'", true)]
    #[case("four % two", false)]
    #[case("four % 3", true)]
    fn comparisons(#[case] expr: &str, #[case] expected: bool) {
        assert_eq!(eval(expr), expected, "{expr}");
    }

    #[rstest]
    #[case("four > two && name == 'Ada'", true)]
    #[case("four < two || name == 'Ada'", true)]
    #[case("four < two && name == 'Ada'", false)]
    #[case("!missing", true)]
    #[case("! four > two", false)]
    #[case("four > two || four < two && missing", true)]
    fn connectives(#[case] expr: &str, #[case] expected: bool) {
        assert_eq!(eval(expr), expected, "{expr}");
    }

    #[test]
    fn single_operand_uses_truthiness() {
        assert!(eval("true"));
        assert!(!eval("0"));
        assert!(!eval("missing"));
        assert!(eval("name"));
    }

    #[test]
    fn unparseable_parts_reject_the_chain() {
        let parts = split_expression_parts("a ?? b");
        assert!(BooleanExpression::from_parts(&parts).is_none());
    }
}
