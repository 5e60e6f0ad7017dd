//! Template compilation and caching

mod cache;
#[allow(clippy::module_inception)]
mod compiler;
mod program;

pub use cache::{BoundedCache, MemoryCache, TemplateCache, fingerprint};
pub use compiler::{CompilerState, TemplateCompiler};
pub use program::{CompilationFailure, CompiledProgram};
