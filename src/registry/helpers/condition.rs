use crate::model::TemplateValue;
use crate::registry::{ArgumentDefinition, ArgumentType, Arguments, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext};

/// `f:if` renders its body (or `then`/`else` arguments) based on a boolean
/// condition
///
/// With a `then` argument present the children are ignored on the true
/// branch; without one, the children are the true branch and `else` the
/// false branch.
pub struct IfHelper;

impl ViewHelper for IfHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::required(
                "condition",
                ArgumentType::Boolean,
                "expression deciding which branch renders",
            ),
            ArgumentDefinition::optional("then", ArgumentType::Any, "value for the true branch"),
            ArgumentDefinition::optional("else", ArgumentType::Any, "value for the false branch"),
        ]
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        if args.value("condition").is_truthy() {
            if args.has("then") {
                Ok(args.value("then"))
            } else {
                children.render(ctx)
            }
        } else if args.has("else") {
            Ok(args.value("else"))
        } else {
            Ok(TemplateValue::Null)
        }
    }
}
