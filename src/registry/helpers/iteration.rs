use crate::model::TemplateValue;
use crate::registry::{ArgumentDefinition, ArgumentType, Arguments, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext};
use rustc_hash::FxHashMap;

/// `f:for` renders its children once per entry of an array or object
///
/// The entry value is bound under `as`, the key under `key` when requested,
/// and iteration metadata (index, cycle, isFirst, isLast, isEven, isOdd)
/// under `iteration`.
pub struct ForHelper;

impl ViewHelper for ForHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::required("each", ArgumentType::Any, "collection to iterate"),
            ArgumentDefinition::required("as", ArgumentType::String, "variable name per entry"),
            ArgumentDefinition::optional("key", ArgumentType::String, "variable name for the key"),
            ArgumentDefinition::optional(
                "reverse",
                ArgumentType::Boolean,
                "iterate in reverse order",
            )
            .with_default(TemplateValue::Boolean(false)),
            ArgumentDefinition::optional(
                "iteration",
                ArgumentType::String,
                "variable name for iteration metadata",
            ),
        ]
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let as_name = args.required_string("as").map_err(RenderError::from)?;
        let key_name = args.string("key");
        let iteration_name = args.string("iteration");

        let mut entries = args.value("each").iter_entries();
        if args.boolean("reverse") {
            entries.reverse();
        }
        let total = entries.len();

        let mut output = String::new();
        for (index, (key, value)) in entries.into_iter().enumerate() {
            let mut scope = FxHashMap::default();
            scope.insert(as_name.clone(), value);
            if let Some(key_name) = &key_name {
                scope.insert(key_name.clone(), TemplateValue::String(key));
            }
            if let Some(iteration_name) = &iteration_name {
                scope.insert(iteration_name.clone(), iteration_info(index, total));
            }
            ctx.push_scope(scope);
            let rendered = children.render(ctx);
            ctx.pop_scope();
            output.push_str(&rendered?.render_string());
        }
        Ok(TemplateValue::String(output))
    }
}

fn iteration_info(index: usize, total: usize) -> TemplateValue {
    let mut info = indexmap::IndexMap::new();
    info.insert("index".to_string(), TemplateValue::Integer(index as i64));
    info.insert("cycle".to_string(), TemplateValue::Integer(index as i64 + 1));
    info.insert("total".to_string(), TemplateValue::Integer(total as i64));
    info.insert("isFirst".to_string(), TemplateValue::Boolean(index == 0));
    info.insert(
        "isLast".to_string(),
        TemplateValue::Boolean(index + 1 == total),
    );
    info.insert("isEven".to_string(), TemplateValue::Boolean(index % 2 == 1));
    info.insert("isOdd".to_string(), TemplateValue::Boolean(index % 2 == 0));
    TemplateValue::Object(info)
}

/// `f:cycle` steps through a fixed list of values, advancing one position
/// every time it renders
///
/// The current value is bound under `as` while the children render. The
/// position is kept in the rendering context, keyed by the `as` name, so
/// repeated invocations inside a loop produce the a-b-a-b pattern.
pub struct CycleHelper;

impl ViewHelper for CycleHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::required("values", ArgumentType::Any, "values to cycle through"),
            ArgumentDefinition::required("as", ArgumentType::String, "variable name for the current value"),
        ]
    }

    fn render(
        &self,
        args: &Arguments,
        children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let as_name = args.required_string("as").map_err(RenderError::from)?;
        let values: Vec<TemplateValue> = args
            .value("values")
            .iter_entries()
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        if values.is_empty() {
            return children.render(ctx);
        }

        let state_key = format!("cycle:{as_name}");
        let position = ctx
            .helper_var(&state_key)
            .and_then(|value| value.as_integer())
            .unwrap_or(0) as usize;
        let current = values[position % values.len()].clone();
        ctx.set_helper_var(&state_key, TemplateValue::Integer(position as i64 + 1));

        let mut scope = FxHashMap::default();
        scope.insert(as_name, current);
        ctx.push_scope(scope);
        let rendered = children.render(ctx);
        ctx.pop_scope();
        rendered
    }
}
