//! Rendering: contexts, tree evaluation, template lookup and the parsed
//! template type

mod context;
mod error;
mod parsed;
mod paths;
mod renderer;

pub use context::{MAX_RENDER_DEPTH, RenderingContext};
pub use error::{RenderError, RenderResult};
pub use parsed::{ParsedTemplate, TemplateBody};
pub use paths::{FilesystemTemplates, InMemoryTemplates, TemplatePaths};
pub use renderer::{ChildBlock, evaluate, html_escape, html_escape_with, render_nodes};
