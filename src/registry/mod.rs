//! Helper registry: the trait, the resolver, argument binding, and the
//! builtin `f` namespace

mod helper;
pub mod helpers;
mod invoker;
mod resolver;

pub use helper::{
    ArgumentDefinition, ArgumentType, Arguments, CompileResult, HelperError, ViewHelper,
};
pub use invoker::bind_arguments;
pub use resolver::HelperResolver;
