//! Rendering context

use super::error::{RenderError, RenderResult};
use super::paths::TemplatePaths;
use super::renderer;
use crate::ast::SyntaxNode;
use crate::model::{StandardVariableProvider, TemplateValue, VariableProvider};
use crate::parser::TemplateParser;
use crate::registry::HelperResolver;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Hard ceiling for nested rendering (partials, layouts, recursive helpers)
pub const MAX_RENDER_DEPTH: usize = 100;

/// Everything one render pass needs: variables, helper state, the resolver,
/// template lookup and the section table of the template being rendered
///
/// A context belongs to exactly one render pass and is never shared between
/// threads; the parsed tree it renders is the shared, read-only part.
pub struct RenderingContext {
    variables: StandardVariableProvider,
    helper_variables: FxHashMap<String, TemplateValue>,
    resolver: Arc<HelperResolver>,
    paths: Option<Arc<dyn TemplatePaths>>,
    sections: IndexMap<String, Arc<Vec<SyntaxNode>>>,
    resource_base: String,
    depth: usize,
}

impl RenderingContext {
    pub fn new(resolver: Arc<HelperResolver>) -> Self {
        Self {
            variables: StandardVariableProvider::new(),
            helper_variables: FxHashMap::default(),
            resolver,
            paths: None,
            sections: IndexMap::new(),
            resource_base: "/_resources".to_string(),
            depth: 0,
        }
    }

    /// Context pre-loaded with top-level variables
    pub fn with_variables(
        resolver: Arc<HelperResolver>,
        variables: FxHashMap<String, TemplateValue>,
    ) -> Self {
        let mut ctx = Self::new(resolver);
        ctx.variables = StandardVariableProvider::from_map(variables);
        ctx
    }

    pub fn variables(&self) -> &StandardVariableProvider {
        &self.variables
    }

    pub fn assign(&self, name: impl Into<String>, value: TemplateValue) {
        self.variables.assign(name, value);
    }

    pub fn lookup(&self, path: &str) -> TemplateValue {
        self.variables.get_by_path(path)
    }

    pub fn push_scope(&self, overlay: FxHashMap<String, TemplateValue>) {
        self.variables.push_scope(overlay);
    }

    pub fn pop_scope(&self) {
        self.variables.pop_scope();
    }

    /// Cross-invocation helper state (e.g. cycle positions)
    pub fn helper_var(&self, key: &str) -> Option<TemplateValue> {
        self.helper_variables.get(key).cloned()
    }

    pub fn set_helper_var(&mut self, key: &str, value: TemplateValue) {
        self.helper_variables.insert(key.to_string(), value);
    }

    pub fn resolver(&self) -> &Arc<HelperResolver> {
        &self.resolver
    }

    pub fn set_paths(&mut self, paths: Arc<dyn TemplatePaths>) {
        self.paths = Some(paths);
    }

    pub fn paths(&self) -> Option<&Arc<dyn TemplatePaths>> {
        self.paths.as_ref()
    }

    /// Replace the active section table, returning the previous one
    pub fn swap_sections(
        &mut self,
        sections: IndexMap<String, Arc<Vec<SyntaxNode>>>,
    ) -> IndexMap<String, Arc<Vec<SyntaxNode>>> {
        std::mem::replace(&mut self.sections, sections)
    }

    pub fn resource_base(&self) -> &str {
        &self.resource_base
    }

    pub fn set_resource_base(&mut self, base: impl Into<String>) {
        self.resource_base = base.into();
    }

    /// Enter one level of nested rendering
    pub fn enter(&mut self) -> RenderResult<()> {
        if self.depth >= MAX_RENDER_DEPTH {
            return Err(RenderError::RecursionLimit {
                limit: MAX_RENDER_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Render a named section of the template currently being rendered
    pub fn render_section(
        &mut self,
        name: &str,
        variables: Option<IndexMap<String, TemplateValue>>,
        optional: bool,
    ) -> RenderResult<TemplateValue> {
        let Some(nodes) = self.sections.get(name).cloned() else {
            if optional {
                return Ok(TemplateValue::Null);
            }
            return Err(RenderError::SectionNotFound {
                name: name.to_string(),
            });
        };
        self.enter()?;
        let scoped = variables.is_some();
        if let Some(variables) = variables {
            self.push_scope(variables.into_iter().collect());
        }
        let result = renderer::render_nodes(&nodes, self);
        if scoped {
            self.pop_scope();
        }
        self.leave();
        result
    }

    /// Parse and render a named partial template
    pub fn render_partial(
        &mut self,
        name: &str,
        variables: Option<IndexMap<String, TemplateValue>>,
        optional: bool,
    ) -> RenderResult<TemplateValue> {
        let source = self
            .paths
            .as_ref()
            .and_then(|paths| paths.partial_source(name));
        let Some(source) = source else {
            if optional {
                return Ok(TemplateValue::Null);
            }
            return Err(RenderError::TemplateNotFound {
                name: name.to_string(),
            });
        };

        self.enter()?;
        let parsed = TemplateParser::new(self.resolver.clone()).parse(&source);
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                self.leave();
                return Err(err.into());
            }
        };

        // The partial's own sections are visible while it renders
        let saved_sections = self.swap_sections(parsed.sections().clone());
        let scoped = variables.is_some();
        if let Some(variables) = variables {
            self.push_scope(variables.into_iter().collect());
        }
        let result = parsed.render_value(self);
        if scoped {
            self.pop_scope();
        }
        self.sections = saved_sections;
        self.leave();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RenderingContext {
        RenderingContext::new(Arc::new(HelperResolver::standard()))
    }

    #[test]
    fn depth_guard_trips_at_the_limit() {
        let mut ctx = context();
        for _ in 0..MAX_RENDER_DEPTH {
            ctx.enter().expect("below the limit");
        }
        assert!(matches!(
            ctx.enter(),
            Err(RenderError::RecursionLimit { .. })
        ));
    }

    #[test]
    fn missing_section_is_an_error_unless_optional() {
        let mut ctx = context();
        assert!(matches!(
            ctx.render_section("nope", None, false),
            Err(RenderError::SectionNotFound { .. })
        ));
        assert_eq!(
            ctx.render_section("nope", None, true).expect("optional"),
            TemplateValue::Null
        );
    }

    #[test]
    fn missing_partial_is_an_error_unless_optional() {
        let mut ctx = context();
        assert!(matches!(
            ctx.render_partial("nope", None, false),
            Err(RenderError::TemplateNotFound { .. })
        ));
        assert_eq!(
            ctx.render_partial("nope", None, true).expect("optional"),
            TemplateValue::Null
        );
    }
}
