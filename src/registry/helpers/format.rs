use crate::model::TemplateValue;
use crate::registry::{ArgumentDefinition, ArgumentType, Arguments, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext, html_escape_with};

/// `f:format.raw` passes its value through without auto-escaping
pub struct RawHelper;

impl ViewHelper for RawHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![ArgumentDefinition::optional(
            "value",
            ArgumentType::Any,
            "value to output unescaped; children are used when absent",
        )]
    }

    fn escapes_children(&self) -> bool {
        false
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        if args.has("value") {
            Ok(args.value("value"))
        } else {
            children.render(ctx)
        }
    }
}

/// `f:format.htmlspecialchars` escapes HTML metacharacters explicitly
///
/// Children are not auto-escaped on top, so the output is escaped exactly
/// once.
pub struct HtmlspecialcharsHelper;

impl ViewHelper for HtmlspecialcharsHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::optional(
                "value",
                ArgumentType::String,
                "string to escape; children are used when absent",
            ),
            ArgumentDefinition::optional(
                "keepQuotes",
                ArgumentType::Boolean,
                "leave single and double quotes unescaped",
            )
            .with_default(TemplateValue::Boolean(false)),
        ]
    }

    fn escapes_children(&self) -> bool {
        false
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let input = match args.string("value") {
            Some(value) => value,
            None => children.render(ctx)?.render_string(),
        };
        let escaped = html_escape_with(&input, !args.boolean("keepQuotes"));
        Ok(TemplateValue::String(escaped))
    }
}
