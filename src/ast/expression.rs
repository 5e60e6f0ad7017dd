//! Shorthand expression nodes
//!
//! Shorthand syntax `{...}` that is not a plain accessor is matched against
//! the expression node forms in a fixed priority order: ternary first, then
//! math, cast and null-coalescing. The first matcher that claims the
//! tokenized parts wins; a bare object accessor is the fallback when none
//! match.

use super::boolean::BooleanExpression;
use crate::model::{TemplateValue, VariableProvider};
use serde::{Deserialize, Serialize};

/// A single operand inside a shorthand expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionOperand {
    /// Literal value (number, quoted string or boolean)
    Literal(TemplateValue),
    /// Dotted-path variable reference
    Accessor(String),
}

impl ExpressionOperand {
    /// Parse a single expression part into an operand
    ///
    /// Recognizes quoted strings, integers, floats and the boolean keywords;
    /// anything shaped like a dotted identifier becomes an accessor.
    pub fn parse(part: &str) -> Option<ExpressionOperand> {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }
        if (part.starts_with('\'') && part.ends_with('\'') && part.len() >= 2)
            || (part.starts_with('"') && part.ends_with('"') && part.len() >= 2)
        {
            let inner = &part[1..part.len() - 1];
            let unescaped = inner.replace("\\'", "'").replace("\\\"", "\"");
            return Some(ExpressionOperand::Literal(TemplateValue::String(unescaped)));
        }
        if let Ok(i) = part.parse::<i64>() {
            return Some(ExpressionOperand::Literal(TemplateValue::Integer(i)));
        }
        if let Ok(f) = part.parse::<f64>() {
            return Some(ExpressionOperand::Literal(TemplateValue::Float(f)));
        }
        match part {
            "true" => return Some(ExpressionOperand::Literal(TemplateValue::Boolean(true))),
            "false" => return Some(ExpressionOperand::Literal(TemplateValue::Boolean(false))),
            "null" => return Some(ExpressionOperand::Literal(TemplateValue::Null)),
            _ => {}
        }
        if is_accessor_path(part) {
            return Some(ExpressionOperand::Accessor(part.to_string()));
        }
        None
    }

    /// Evaluate against the active variable provider; accessor misses are
    /// silent `Null`
    pub fn evaluate(&self, variables: &dyn VariableProvider) -> TemplateValue {
        match self {
            ExpressionOperand::Literal(value) => value.clone(),
            ExpressionOperand::Accessor(path) => variables.get_by_path(path),
        }
    }
}

/// True if the string is a valid dotted accessor path
pub(crate) fn is_accessor_path(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
}

/// Binary math operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOperator {
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,
    /// Power (`^`)
    Power,
}

impl MathOperator {
    fn parse(part: &str) -> Option<MathOperator> {
        match part {
            "+" => Some(MathOperator::Add),
            "-" => Some(MathOperator::Subtract),
            "*" => Some(MathOperator::Multiply),
            "/" => Some(MathOperator::Divide),
            "%" => Some(MathOperator::Modulo),
            "^" => Some(MathOperator::Power),
            _ => None,
        }
    }

    /// Apply the operator to two values
    ///
    /// Integer operands stay integral where the result allows it; division
    /// falls back to a float when the operands do not divide evenly. Missing
    /// operands count as zero; division or modulo by zero yields `Null`.
    pub fn apply(self, left: &TemplateValue, right: &TemplateValue) -> TemplateValue {
        let (li, ri) = (left.as_integer(), right.as_integer());
        let lf = left.as_number().unwrap_or(0.0);
        let rf = right.as_number().unwrap_or(0.0);
        match self {
            MathOperator::Add => int_or_float(li, ri, i64::checked_add, lf + rf),
            MathOperator::Subtract => int_or_float(li, ri, i64::checked_sub, lf - rf),
            MathOperator::Multiply => int_or_float(li, ri, i64::checked_mul, lf * rf),
            MathOperator::Divide => {
                if rf == 0.0 {
                    return TemplateValue::Null;
                }
                if let (Some(a), Some(b)) = (li, ri)
                    && b != 0
                    && a % b == 0
                {
                    return TemplateValue::Integer(a / b);
                }
                TemplateValue::Float(lf / rf)
            }
            MathOperator::Modulo => {
                if rf == 0.0 {
                    return TemplateValue::Null;
                }
                if let (Some(a), Some(b)) = (li, ri)
                    && b != 0
                {
                    return TemplateValue::Integer(a % b);
                }
                TemplateValue::Float(lf % rf)
            }
            MathOperator::Power => {
                if let (Some(a), Some(b)) = (li, ri)
                    && (0..=63).contains(&b)
                    && let Some(result) = a.checked_pow(b as u32)
                {
                    return TemplateValue::Integer(result);
                }
                TemplateValue::Float(lf.powf(rf))
            }
        }
    }
}

fn int_or_float(
    li: Option<i64>,
    ri: Option<i64>,
    op: fn(i64, i64) -> Option<i64>,
    fallback: f64,
) -> TemplateValue {
    if let (Some(a), Some(b)) = (li, ri)
        && let Some(result) = op(a, b)
    {
        return TemplateValue::Integer(result);
    }
    TemplateValue::Float(fallback)
}

/// Target type of a cast expression (`value as type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastTarget {
    /// `as integer`
    Integer,
    /// `as float`
    Float,
    /// `as string`
    String,
    /// `as boolean`
    Boolean,
    /// `as array`
    Array,
}

impl CastTarget {
    fn parse(part: &str) -> Option<CastTarget> {
        match part {
            "integer" => Some(CastTarget::Integer),
            "float" | "decimal" => Some(CastTarget::Float),
            "string" => Some(CastTarget::String),
            "boolean" => Some(CastTarget::Boolean),
            "array" => Some(CastTarget::Array),
            _ => None,
        }
    }

    /// Apply the cast
    pub fn apply(self, value: TemplateValue) -> TemplateValue {
        match self {
            CastTarget::Integer => TemplateValue::Integer(
                value
                    .as_integer()
                    .or_else(|| value.as_number().map(|f| f as i64))
                    .unwrap_or(0),
            ),
            CastTarget::Float => TemplateValue::Float(value.as_number().unwrap_or(0.0)),
            CastTarget::String => TemplateValue::String(value.render_string()),
            CastTarget::Boolean => TemplateValue::Boolean(value.is_truthy()),
            CastTarget::Array => match value {
                TemplateValue::Array(items) => TemplateValue::Array(items),
                TemplateValue::Object(entries) => {
                    TemplateValue::Array(entries.into_iter().map(|(_, v)| v).collect())
                }
                TemplateValue::Null => TemplateValue::Array(Vec::new()),
                scalar => TemplateValue::Array(vec![scalar]),
            },
        }
    }
}

/// A matched shorthand expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionNode {
    /// `cond ? then : else`
    Ternary {
        /// Condition; may be a full comparison chain
        condition: BooleanExpression,
        /// Value when the condition holds
        then: ExpressionOperand,
        /// Value when the condition does not hold
        otherwise: ExpressionOperand,
    },
    /// `a OP b (OP c ...)`, evaluated pairwise left to right
    Math {
        /// First operand
        first: ExpressionOperand,
        /// Remaining operator/operand pairs
        rest: Vec<(MathOperator, ExpressionOperand)>,
    },
    /// `value as type`
    Cast {
        /// Operand to convert
        value: ExpressionOperand,
        /// Target type
        target: CastTarget,
    },
    /// `a ?? b ?? c` — first non-null operand wins
    NullCoalescing {
        /// Candidate operands, left to right
        operands: Vec<ExpressionOperand>,
    },
}

impl ExpressionNode {
    /// Try all expression matchers against tokenized parts, in the fixed
    /// priority order; first match wins
    pub fn try_match(parts: &[String]) -> Option<ExpressionNode> {
        Self::match_ternary(parts)
            .or_else(|| Self::match_math(parts))
            .or_else(|| Self::match_cast(parts))
            .or_else(|| Self::match_null_coalescing(parts))
    }

    fn match_ternary(parts: &[String]) -> Option<ExpressionNode> {
        let question = parts.iter().position(|p| p == "?")?;
        if question == 0 || question + 4 != parts.len() || parts[question + 2] != ":" {
            return None;
        }
        let condition = BooleanExpression::from_parts(&parts[..question])?;
        let then = ExpressionOperand::parse(&parts[question + 1])?;
        let otherwise = ExpressionOperand::parse(&parts[question + 3])?;
        Some(ExpressionNode::Ternary {
            condition,
            then,
            otherwise,
        })
    }

    fn match_math(parts: &[String]) -> Option<ExpressionNode> {
        if parts.len() < 3 || parts.len() % 2 == 0 {
            return None;
        }
        let first = ExpressionOperand::parse(&parts[0])?;
        let mut rest = Vec::with_capacity(parts.len() / 2);
        for pair in parts[1..].chunks(2) {
            let operator = MathOperator::parse(&pair[0])?;
            let operand = ExpressionOperand::parse(&pair[1])?;
            rest.push((operator, operand));
        }
        Some(ExpressionNode::Math { first, rest })
    }

    fn match_cast(parts: &[String]) -> Option<ExpressionNode> {
        if parts.len() != 3 || parts[1] != "as" {
            return None;
        }
        let value = ExpressionOperand::parse(&parts[0])?;
        let target = CastTarget::parse(&parts[2])?;
        Some(ExpressionNode::Cast { value, target })
    }

    fn match_null_coalescing(parts: &[String]) -> Option<ExpressionNode> {
        if parts.len() < 3 || parts.len() % 2 == 0 {
            return None;
        }
        let mut operands = Vec::with_capacity(parts.len() / 2 + 1);
        operands.push(ExpressionOperand::parse(&parts[0])?);
        for pair in parts[1..].chunks(2) {
            if pair[0] != "??" {
                return None;
            }
            operands.push(ExpressionOperand::parse(&pair[1])?);
        }
        Some(ExpressionNode::NullCoalescing { operands })
    }

    /// Evaluate against the active variable provider
    pub fn evaluate(&self, variables: &dyn VariableProvider) -> TemplateValue {
        match self {
            ExpressionNode::Ternary {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(variables) {
                    then.evaluate(variables)
                } else {
                    otherwise.evaluate(variables)
                }
            }
            ExpressionNode::Math { first, rest } => {
                let mut current = first.evaluate(variables);
                for (operator, operand) in rest {
                    let rhs = operand.evaluate(variables);
                    current = operator.apply(&current, &rhs);
                }
                current
            }
            ExpressionNode::Cast { value, target } => target.apply(value.evaluate(variables)),
            ExpressionNode::NullCoalescing { operands } => operands
                .iter()
                .map(|operand| operand.evaluate(variables))
                .find(|value| !value.is_null())
                .unwrap_or(TemplateValue::Null),
        }
    }
}

/// Tokenize shorthand content into expression parts
///
/// Quoted strings stay intact; operators split even without surrounding
/// whitespace, so `a+b` and `a + b` tokenize identically.
pub fn split_expression_parts(content: &str) -> Vec<String> {
    const MULTI_CHAR: [&str; 5] = ["??", "==", "!=", "<=", ">="];
    const SINGLE_CHAR: [char; 12] = [
        '+', '-', '*', '/', '%', '^', '?', ':', '<', '>', '!', '=',
    ];

    let chars: Vec<char> = content.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut i = 0;

    let flush = |parts: &mut Vec<String>, current: &mut String| {
        if !current.is_empty() {
            parts.push(std::mem::take(current));
        }
    };

    while i < chars.len() {
        let ch = chars[i];
        if let Some(q) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if ch == '\'' || ch == '"' {
            quote = Some(ch);
            current.push(ch);
            i += 1;
            continue;
        }
        if ch.is_whitespace() {
            flush(&mut parts, &mut current);
            i += 1;
            continue;
        }
        if i + 1 < chars.len() {
            let pair: String = [ch, chars[i + 1]].iter().collect();
            if MULTI_CHAR.contains(&pair.as_str()) {
                flush(&mut parts, &mut current);
                parts.push(pair);
                i += 2;
                continue;
            }
        }
        if SINGLE_CHAR.contains(&ch) {
            flush(&mut parts, &mut current);
            parts.push(ch.to_string());
            i += 1;
            continue;
        }
        current.push(ch);
        i += 1;
    }
    flush(&mut parts, &mut current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StandardVariableProvider;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn variables() -> StandardVariableProvider {
        let provider = StandardVariableProvider::new();
        provider.assign("a", TemplateValue::Integer(1));
        provider.assign("b", TemplateValue::Integer(1));
        provider.assign("c", TemplateValue::from("3"));
        provider
    }

    fn eval(expr: &str, provider: &StandardVariableProvider) -> TemplateValue {
        let parts = split_expression_parts(expr);
        ExpressionNode::try_match(&parts)
            .unwrap_or_else(|| panic!("no matcher claimed {expr:?}"))
            .evaluate(provider)
    }

    #[rstest]
    #[case("a + b", TemplateValue::Integer(2))]
    #[case("a+b", TemplateValue::Integer(2))]
    #[case("4 % 2", TemplateValue::Integer(0))]
    #[case("4%2", TemplateValue::Integer(0))]
    #[case("1 ^ 4", TemplateValue::Integer(1))]
    #[case("1^4", TemplateValue::Integer(1))]
    #[case("2 ^ 3", TemplateValue::Integer(8))]
    #[case("5 / 2", TemplateValue::Float(2.5))]
    #[case("4 / 2", TemplateValue::Integer(2))]
    #[case("1 + 2 * 3", TemplateValue::Integer(9))] // pairwise left to right
    fn math_expressions(#[case] expr: &str, #[case] expected: TemplateValue) {
        assert_eq!(eval(expr, &variables()), expected);
    }

    #[rstest]
    #[case("true ? 'yes' : 'no'", "yes")]
    #[case("0 ? 'yes' : 'no'", "no")]
    #[case("a == b ? 'eq' : 'ne'", "eq")]
    fn ternary_expressions(#[case] expr: &str, #[case] expected: &str) {
        assert_eq!(eval(expr, &variables()), TemplateValue::from(expected));
    }

    #[test]
    fn null_coalescing_picks_first_resolved() {
        let provider = variables();
        assert_eq!(eval("x ?? y ?? c", &provider), TemplateValue::from("3"));
        assert_eq!(eval("a ?? c", &provider), TemplateValue::Integer(1));
        assert_eq!(eval("x ?? y", &provider), TemplateValue::Null);
    }

    #[rstest]
    #[case("c as integer", TemplateValue::Integer(3))]
    #[case("a as string", TemplateValue::from("1"))]
    #[case("0 as boolean", TemplateValue::Boolean(false))]
    fn cast_expressions(#[case] expr: &str, #[case] expected: TemplateValue) {
        assert_eq!(eval(expr, &variables()), expected);
    }

    #[test]
    fn matcher_priority_is_fixed() {
        // "a ? b : c" must be claimed by ternary, not fall through
        let parts = split_expression_parts("a ? 1 : 2");
        assert!(matches!(
            ExpressionNode::try_match(&parts),
            Some(ExpressionNode::Ternary { .. })
        ));
        // "a as integer" is a cast, not math
        let parts = split_expression_parts("a as integer");
        assert!(matches!(
            ExpressionNode::try_match(&parts),
            Some(ExpressionNode::Cast { .. })
        ));
    }

    #[test]
    fn quoted_strings_survive_splitting() {
        let parts = split_expression_parts("cond ? 'a b' : \"c d\"");
        assert_eq!(parts, vec!["cond", "?", "'a b'", ":", "\"c d\""]);
    }
}
