use crate::ast::ViewHelperNode;
use crate::model::TemplateValue;
use crate::parser::ParsingState;
use crate::registry::{ArgumentDefinition, ArgumentType, Arguments, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext};
use indexmap::IndexMap;

/// `f:section` declares a named block rendered on demand
///
/// Declaring is a parse-time effect; at render time the node itself emits
/// nothing. Sections are rendered through a layout or `f:render`.
pub struct SectionHelper;

impl ViewHelper for SectionHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![ArgumentDefinition::required(
            "name",
            ArgumentType::String,
            "section name",
        )]
    }

    fn render(
        &self,
        _args: &Arguments,
        _children: &ChildBlock<'_>,
        _ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        Ok(TemplateValue::Null)
    }

    fn post_parse(&self, node: &ViewHelperNode, state: &mut ParsingState) {
        // Dynamic section names cannot be registered ahead of rendering
        if let Some(name) = node.arguments.get("name").and_then(|n| n.static_text()) {
            state.add_section(name, node.children.clone());
        } else {
            log::warn!("section with non-static name is not registered");
        }
    }
}

/// `f:layout` names the layout template wrapping this one
pub struct LayoutHelper;

impl ViewHelper for LayoutHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![ArgumentDefinition::required(
            "name",
            ArgumentType::String,
            "layout template name",
        )]
    }

    fn render(
        &self,
        _args: &Arguments,
        _children: &ChildBlock<'_>,
        _ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        Ok(TemplateValue::Null)
    }

    fn post_parse(&self, node: &ViewHelperNode, state: &mut ParsingState) {
        if let Some(name) = node.arguments.get("name") {
            state.set_layout(name.clone());
        }
    }
}

/// `f:render` renders a named section or a partial template
///
/// `optional` turns a missing section or partial into empty output instead
/// of an error. `arguments` replaces the variable scope for the rendered
/// content.
pub struct RenderHelper;

impl ViewHelper for RenderHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::optional("section", ArgumentType::String, "section to render"),
            ArgumentDefinition::optional("partial", ArgumentType::String, "partial template to render"),
            ArgumentDefinition::optional(
                "arguments",
                ArgumentType::Object,
                "variables visible inside the rendered content",
            ),
            ArgumentDefinition::optional(
                "optional",
                ArgumentType::Boolean,
                "missing targets render as empty output",
            )
            .with_default(TemplateValue::Boolean(false)),
        ]
    }

    fn render(
        &self,
        args: &Arguments,
        _children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let optional = args.boolean("optional");
        let variables = match args.value("arguments") {
            TemplateValue::Object(entries) => {
                Some(entries.into_iter().collect::<IndexMap<_, _>>())
            }
            _ => None,
        };

        if let Some(partial) = args.string("partial") {
            return ctx.render_partial(&partial, variables, optional);
        }
        if let Some(section) = args.string("section") {
            return ctx.render_section(&section, variables, optional);
        }
        Ok(TemplateValue::Null)
    }
}
