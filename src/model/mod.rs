//! Value model and variable resolution for template rendering
//!
//! This module provides the closed value type produced by template evaluation
//! and the variable providers templates are rendered against.

mod value;
mod variables;

pub use value::TemplateValue;
pub use variables::{
    ChainedVariableProvider, StandardVariableProvider, VariableProvider, resolve_path,
};
