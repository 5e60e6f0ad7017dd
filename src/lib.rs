//! # vellum
//!
//! A markup template engine. Templates mix literal output with helper tags
//! (`<f:if condition="{logged}">...</f:if>`) and shorthand expressions
//! (`{user.name}`, `{a + b}`, `{value -> f:format.raw()}`), are parsed into
//! a shareable syntax tree, optionally constant-folded into a cached
//! compiled form, and rendered against a variable map.
//!
//! ```
//! use vellum::TemplateEngine;
//! use vellum::engine::variables_from_json;
//!
//! let engine = TemplateEngine::new();
//! let output = engine
//!     .render_source(
//!         "Hello {name}.",
//!         variables_from_json(serde_json::json!({"name": "World"})),
//!     )
//!     .unwrap();
//! assert_eq!(output, "Hello World.");
//! ```
//!
//! Output is HTML-escaped by default; `f:format.raw`, the `{escaping off}`
//! directive and helpers that declare raw children opt out selectively.

pub mod ast;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod registry;
pub mod rendering;

pub use engine::TemplateEngine;
pub use error::{TemplateError, TemplateResult};
pub use model::TemplateValue;
pub use parser::{ParseError, TemplateParser};
pub use registry::{HelperResolver, ViewHelper};
pub use rendering::{ParsedTemplate, RenderError, RenderingContext};
