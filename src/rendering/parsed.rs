//! The parse result and its render entry points

use super::context::RenderingContext;
use super::error::{RenderError, RenderResult};
use super::renderer;
use crate::ast::{RootNode, SyntaxNode};
use crate::compiler::CompiledProgram;
use crate::model::TemplateValue;
use crate::parser::{ParsingState, TemplateParser};
use indexmap::IndexMap;
use std::sync::Arc;

/// How the template body is represented
#[derive(Debug)]
pub enum TemplateBody {
    /// Freshly parsed syntax tree
    Interpreted(RootNode),
    /// Constant-folded executable form
    Compiled(CompiledProgram),
    /// `{parsing off}`: the marker-stripped source is the output
    Passthrough(String),
}

/// A fully parsed template, ready to render
///
/// Shared read-only between renders; every render pass brings its own
/// [`RenderingContext`].
#[derive(Debug)]
pub struct ParsedTemplate {
    body: TemplateBody,
    sections: IndexMap<String, Arc<Vec<SyntaxNode>>>,
    layout: Option<SyntaxNode>,
    compilable: bool,
}

impl ParsedTemplate {
    /// Passthrough template; render output equals the given source
    pub fn passthrough(source: String) -> Self {
        Self {
            body: TemplateBody::Passthrough(source),
            sections: IndexMap::new(),
            layout: None,
            compilable: false,
        }
    }

    /// Interpreted template carrying the state collected while parsing
    pub fn interpreted(root: RootNode, state: ParsingState) -> Self {
        Self {
            body: TemplateBody::Interpreted(root),
            sections: state.sections,
            layout: state.layout,
            compilable: state.compilable,
        }
    }

    /// Rebuild a template from its compiled form
    pub fn from_program(program: CompiledProgram) -> Self {
        let sections = program
            .sections
            .iter()
            .map(|(name, nodes)| (name.clone(), Arc::new(nodes.clone())))
            .collect();
        let layout = program.layout.clone();
        Self {
            body: TemplateBody::Compiled(program),
            sections,
            layout,
            compilable: true,
        }
    }

    pub fn body(&self) -> &TemplateBody {
        &self.body
    }

    /// The tree root, for interpreted and compiled templates
    pub fn root(&self) -> Option<&RootNode> {
        match &self.body {
            TemplateBody::Interpreted(root) => Some(root),
            TemplateBody::Compiled(program) => Some(&program.root),
            TemplateBody::Passthrough(_) => None,
        }
    }

    pub fn sections(&self) -> &IndexMap<String, Arc<Vec<SyntaxNode>>> {
        &self.sections
    }

    pub fn has_layout(&self) -> bool {
        self.layout.is_some()
    }

    pub fn layout_node(&self) -> Option<&SyntaxNode> {
        self.layout.as_ref()
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self.body, TemplateBody::Passthrough(_))
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self.body, TemplateBody::Compiled(_))
    }

    pub fn is_compilable(&self) -> bool {
        self.compilable
    }

    /// The layout name, evaluated against the render context
    pub fn layout_name(&self, ctx: &mut RenderingContext) -> RenderResult<Option<String>> {
        match &self.layout {
            Some(node) => Ok(Some(renderer::evaluate(node, ctx)?.render_string())),
            None => Ok(None),
        }
    }

    /// Render the body only, without layout resolution
    ///
    /// Partials and warmup execution use this; a single-node body keeps its
    /// value type.
    pub fn render_value(&self, ctx: &mut RenderingContext) -> RenderResult<TemplateValue> {
        match &self.body {
            TemplateBody::Passthrough(source) => Ok(TemplateValue::String(source.clone())),
            TemplateBody::Interpreted(root) => renderer::render_nodes(&root.children, ctx),
            TemplateBody::Compiled(program) => renderer::render_nodes(&program.root.children, ctx),
        }
    }

    /// Render to the final output string, resolving the layout if the
    /// template declared one
    pub fn render(&self, ctx: &mut RenderingContext) -> RenderResult<String> {
        if let TemplateBody::Passthrough(source) = &self.body {
            return Ok(source.clone());
        }
        let Some(name) = self.layout_name(ctx)? else {
            return Ok(self.render_value(ctx)?.render_string());
        };

        let source = ctx
            .paths()
            .and_then(|paths| paths.layout_source(&name))
            .ok_or_else(|| RenderError::TemplateNotFound { name: name.clone() })?;
        let layout = TemplateParser::new(ctx.resolver().clone()).parse(&source)?;

        // The layout renders against this template's sections
        let saved_sections = ctx.swap_sections(self.sections.clone());
        ctx.enter()?;
        let result = layout.render_value(ctx);
        ctx.leave();
        ctx.swap_sections(saved_sections);
        Ok(result?.render_string())
    }
}
