//! High-level engine facade

use crate::compiler::{MemoryCache, TemplateCache, TemplateCompiler};
use crate::error::TemplateResult;
use crate::model::TemplateValue;
use crate::registry::HelperResolver;
use crate::rendering::{RenderError, RenderingContext, TemplatePaths};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Parse, compile, cache and render templates behind one entry point
///
/// The engine is cheap to share: templates are cached by source fingerprint
/// and every render gets its own context, so concurrent renders of the same
/// template are safe.
pub struct TemplateEngine {
    resolver: Arc<HelperResolver>,
    compiler: TemplateCompiler,
    paths: Option<Arc<dyn TemplatePaths>>,
}

impl TemplateEngine {
    /// Engine with the standard `f` namespace and an unbounded cache
    pub fn new() -> Self {
        Self::with_cache(
            Arc::new(HelperResolver::standard()),
            Arc::new(MemoryCache::new()),
        )
    }

    pub fn with_cache(resolver: Arc<HelperResolver>, cache: Arc<dyn TemplateCache>) -> Self {
        Self {
            compiler: TemplateCompiler::new(resolver.clone(), cache),
            resolver,
            paths: None,
        }
    }

    /// Attach a template lookup backend for named templates, partials and
    /// layouts
    pub fn set_paths(&mut self, paths: Arc<dyn TemplatePaths>) {
        self.paths = Some(paths);
    }

    pub fn resolver(&self) -> &Arc<HelperResolver> {
        &self.resolver
    }

    pub fn compiler(&self) -> &TemplateCompiler {
        &self.compiler
    }

    /// Drop all cached templates
    pub fn flush_cache(&self) {
        self.compiler.cache().flush();
    }

    /// Pre-compile everything the path backend knows about
    pub fn warm_up(&self, overlay: FxHashMap<String, TemplateValue>) -> usize {
        match &self.paths {
            Some(paths) => self.compiler.warm_up(paths.as_ref(), overlay),
            None => 0,
        }
    }

    /// Render template source against a variable map
    pub fn render_source(
        &self,
        source: &str,
        variables: FxHashMap<String, TemplateValue>,
    ) -> TemplateResult<String> {
        let parsed = self.compiler.fetch(source)?;
        let mut ctx = RenderingContext::with_variables(self.resolver.clone(), variables);
        if let Some(paths) = &self.paths {
            ctx.set_paths(paths.clone());
        }
        ctx.swap_sections(parsed.sections().clone());
        Ok(parsed.render(&mut ctx)?)
    }

    /// Render a named template from the attached path backend
    pub fn render(
        &self,
        name: &str,
        variables: FxHashMap<String, TemplateValue>,
    ) -> TemplateResult<String> {
        let source = self
            .paths
            .as_ref()
            .and_then(|paths| paths.template_source(name))
            .ok_or_else(|| RenderError::TemplateNotFound {
                name: name.to_string(),
            })?;
        self.render_source(&source, variables)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a variable map from a JSON object; non-object values are ignored
pub fn variables_from_json(value: serde_json::Value) -> FxHashMap<String, TemplateValue> {
    let mut variables = FxHashMap::default();
    if let serde_json::Value::Object(entries) = value {
        for (name, value) in entries {
            variables.insert(name, TemplateValue::from(value));
        }
    }
    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(json: serde_json::Value) -> FxHashMap<String, TemplateValue> {
        variables_from_json(json)
    }

    #[test]
    fn renders_source_with_variables() {
        let engine = TemplateEngine::new();
        let output = engine
            .render_source("Hello {name}.", vars(serde_json::json!({"name": "World"})))
            .expect("render");
        assert_eq!(output, "Hello World.");
    }

    #[test]
    fn default_escaping_is_active_through_the_engine() {
        let engine = TemplateEngine::new();
        let output = engine
            .render_source(
                "Hello {name}.",
                vars(serde_json::json!({"name": "<script>alert(1)</script>"})),
            )
            .expect("render");
        assert_eq!(output, "Hello &lt;script&gt;alert(1)&lt;/script&gt;.");
    }

    #[test]
    fn named_rendering_requires_a_path_backend() {
        let engine = TemplateEngine::new();
        let err = engine.render("Index", FxHashMap::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::TemplateError::Render(RenderError::TemplateNotFound { .. })
        ));
    }
}
