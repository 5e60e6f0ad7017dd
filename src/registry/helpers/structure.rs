use crate::model::TemplateValue;
use crate::registry::{ArgumentDefinition, ArgumentType, Arguments, HelperError, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext};
use rustc_hash::FxHashMap;

/// `f:alias` binds additional variable names while its children render
pub struct AliasHelper;

impl ViewHelper for AliasHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![ArgumentDefinition::required(
            "map",
            ArgumentType::Object,
            "name-to-value map visible inside the body",
        )]
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let map = args.required_value("map").map_err(RenderError::from)?;
        let mut scope = FxHashMap::default();
        if let TemplateValue::Object(entries) = map {
            for (name, value) in entries {
                scope.insert(name.clone(), value.clone());
            }
        }
        ctx.push_scope(scope);
        let rendered = children.render(ctx);
        ctx.pop_scope();
        rendered
    }
}

/// `f:count` yields the number of entries in an array or object
pub struct CountHelper;

impl ViewHelper for CountHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![ArgumentDefinition::optional(
            "subject",
            ArgumentType::Any,
            "collection to count; children are used when absent",
        )]
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let subject = if args.has("subject") {
            args.value("subject")
        } else {
            children.render(ctx)?
        };
        match subject.len() {
            Some(count) => Ok(TemplateValue::Integer(count as i64)),
            None => Err(RenderError::from(HelperError::InvalidArgument {
                helper: args.helper().to_string(),
                argument: "subject".to_string(),
                expected: "a countable collection",
                actual: subject.type_name().to_string(),
            })),
        }
    }
}
