//! The view helper abstraction
//!
//! Helpers are stateless and shared behind `Arc`; anything a helper needs to
//! remember between invocations lives in the rendering context's helper
//! variable container.

use crate::ast::ViewHelperNode;
use crate::model::TemplateValue;
use crate::parser::ParsingState;
use crate::rendering::{ChildBlock, RenderingContext};
use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised while binding or consuming helper arguments
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HelperError {
    #[error("missing required argument '{argument}' for helper '{helper}'")]
    MissingArgument { helper: String, argument: String },

    #[error("unknown argument '{argument}' passed to helper '{helper}'")]
    UnknownArgument { helper: String, argument: String },

    #[error(
        "argument '{argument}' of helper '{helper}' expects {expected}, got {actual}"
    )]
    InvalidArgument {
        helper: String,
        argument: String,
        expected: &'static str,
        actual: String,
    },

    #[error("helper '{helper}': {message}")]
    Message { helper: String, message: String },
}

/// Declared type of a helper argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Any,
}

impl ArgumentType {
    pub fn name(self) -> &'static str {
        match self {
            ArgumentType::String => "string",
            ArgumentType::Integer => "integer",
            ArgumentType::Float => "float",
            ArgumentType::Boolean => "boolean",
            ArgumentType::Array => "array",
            ArgumentType::Object => "object",
            ArgumentType::Any => "any",
        }
    }

    /// Coerce a bound value to this type; `None` when no sensible coercion
    /// exists
    pub fn coerce(self, value: TemplateValue) -> Option<TemplateValue> {
        match self {
            ArgumentType::Any => Some(value),
            ArgumentType::String => Some(TemplateValue::String(value.render_string())),
            ArgumentType::Integer => value.as_integer().map(TemplateValue::Integer),
            ArgumentType::Float => value.as_number().map(TemplateValue::Float),
            ArgumentType::Boolean => Some(TemplateValue::Boolean(value.is_truthy())),
            ArgumentType::Array => match value {
                TemplateValue::Array(_) | TemplateValue::Object(_) => Some(value),
                TemplateValue::Null => Some(TemplateValue::Array(Vec::new())),
                _ => None,
            },
            ArgumentType::Object => match value {
                TemplateValue::Object(_) => Some(value),
                _ => None,
            },
        }
    }
}

/// One declared argument of a helper
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: &'static str,
    pub ty: ArgumentType,
    pub required: bool,
    pub default: Option<TemplateValue>,
    pub description: &'static str,
}

impl ArgumentDefinition {
    pub fn required(name: &'static str, ty: ArgumentType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
            description,
        }
    }

    pub fn optional(name: &'static str, ty: ArgumentType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
            description,
        }
    }

    pub fn with_default(mut self, default: TemplateValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// Bound, validated arguments for one helper invocation
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    helper: String,
    values: IndexMap<String, TemplateValue>,
}

impl Arguments {
    pub fn new(helper: impl Into<String>, values: IndexMap<String, TemplateValue>) -> Self {
        Self {
            helper: helper.into(),
            values,
        }
    }

    pub fn helper(&self) -> &str {
        &self.helper
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.values.get(name)
    }

    /// The argument value, or `Null` when absent
    pub fn value(&self, name: &str) -> TemplateValue {
        self.values.get(name).cloned().unwrap_or(TemplateValue::Null)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.values.get(name).map(TemplateValue::render_string)
    }

    pub fn boolean(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(TemplateValue::is_truthy)
    }

    pub fn required_string(&self, name: &str) -> Result<String, HelperError> {
        self.string(name).ok_or_else(|| HelperError::MissingArgument {
            helper: self.helper.clone(),
            argument: name.to_string(),
        })
    }

    pub fn required_value(&self, name: &str) -> Result<&TemplateValue, HelperError> {
        self.values.get(name).ok_or_else(|| HelperError::MissingArgument {
            helper: self.helper.clone(),
            argument: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TemplateValue)> {
        self.values.iter()
    }
}

/// Decision a helper makes when the compiler reaches its node
#[derive(Debug, Clone, PartialEq)]
pub enum CompileResult {
    /// Keep the node as-is; children are compiled individually
    Continue,
    /// Replace the whole node with a constant value
    Replace(TemplateValue),
    /// The template cannot be compiled at all
    Abort {
        reason: String,
        mitigations: Vec<String>,
    },
}

/// A renderable markup helper
///
/// `escapes_children` and `escapes_output` drive the escape interceptor at
/// parse time; `compile` lets a helper fold itself to a constant or veto
/// compilation; `post_parse` runs when the helper's node closes, with access
/// to the parsing state.
pub trait ViewHelper: Send + Sync {
    /// Declared arguments, in declaration order
    fn argument_definitions(&self) -> Vec<ArgumentDefinition>;

    /// Accept arguments beyond the declared ones
    fn allows_arbitrary_arguments(&self) -> bool {
        false
    }

    /// Whether accessors inside this helper's children are auto-escaped
    fn escapes_children(&self) -> bool {
        true
    }

    /// Whether this helper's own output is auto-escaped
    fn escapes_output(&self) -> bool {
        false
    }

    /// Produce the helper's output
    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, crate::rendering::RenderError>;

    /// Compile-time treatment of this helper's nodes
    fn compile(&self, _node: &ViewHelperNode) -> CompileResult {
        CompileResult::Continue
    }

    /// Hook invoked when the node closes during parsing
    fn post_parse(&self, _node: &ViewHelperNode, _state: &mut ParsingState) {}
}
