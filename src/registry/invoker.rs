//! Argument binding and validation

use super::{Arguments, HelperError, ViewHelper};
use crate::model::TemplateValue;
use indexmap::IndexMap;

/// Bind evaluated argument values against a helper's declared definitions
///
/// Required arguments must be present, unknown arguments are rejected unless
/// the helper opts in to arbitrary arguments, defaults are filled in, and
/// each bound value is coerced to its declared type.
pub fn bind_arguments(
    helper: &dyn ViewHelper,
    qualified_name: &str,
    mut values: IndexMap<String, TemplateValue>,
) -> Result<Arguments, HelperError> {
    let definitions = helper.argument_definitions();
    let mut bound = IndexMap::new();

    for definition in &definitions {
        match values.shift_remove(definition.name) {
            Some(value) => {
                let coerced = definition.ty.coerce(value.clone()).ok_or_else(|| {
                    HelperError::InvalidArgument {
                        helper: qualified_name.to_string(),
                        argument: definition.name.to_string(),
                        expected: definition.ty.name(),
                        actual: value.type_name().to_string(),
                    }
                })?;
                bound.insert(definition.name.to_string(), coerced);
            }
            None if definition.required => {
                return Err(HelperError::MissingArgument {
                    helper: qualified_name.to_string(),
                    argument: definition.name.to_string(),
                });
            }
            None => {
                if let Some(default) = &definition.default {
                    bound.insert(definition.name.to_string(), default.clone());
                }
            }
        }
    }

    if !values.is_empty() && !helper.allows_arbitrary_arguments() {
        let argument = values
            .keys()
            .next()
            .cloned()
            .unwrap_or_default();
        return Err(HelperError::UnknownArgument {
            helper: qualified_name.to_string(),
            argument,
        });
    }
    for (name, value) in values {
        bound.insert(name, value);
    }

    Ok(Arguments::new(qualified_name, bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ArgumentDefinition, ArgumentType};
    use crate::rendering::{ChildBlock, RenderError, RenderingContext};

    struct FixtureHelper;

    impl ViewHelper for FixtureHelper {
        fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
            vec![
                ArgumentDefinition::required("each", ArgumentType::Any, "items"),
                ArgumentDefinition::optional("reverse", ArgumentType::Boolean, "flip order")
                    .with_default(TemplateValue::Boolean(false)),
            ]
        }

        fn render(
            &self,
            _args: &Arguments,
            _children: &ChildBlock<'_>,
            _ctx: &mut RenderingContext,
        ) -> Result<TemplateValue, RenderError> {
            Ok(TemplateValue::Null)
        }
    }

    #[test]
    fn defaults_are_applied() {
        let mut values = IndexMap::new();
        values.insert("each".to_string(), TemplateValue::Array(vec![]));
        let args = bind_arguments(&FixtureHelper, "f:fixture", values).unwrap();
        assert_eq!(args.value("reverse"), TemplateValue::Boolean(false));
    }

    #[test]
    fn missing_required_argument_fails() {
        let result = bind_arguments(&FixtureHelper, "f:fixture", IndexMap::new());
        assert_eq!(
            result.err(),
            Some(HelperError::MissingArgument {
                helper: "f:fixture".into(),
                argument: "each".into()
            })
        );
    }

    #[test]
    fn unknown_argument_fails_for_strict_helpers() {
        let mut values = IndexMap::new();
        values.insert("each".to_string(), TemplateValue::Null);
        values.insert("bogus".to_string(), TemplateValue::Null);
        let result = bind_arguments(&FixtureHelper, "f:fixture", values);
        assert_eq!(
            result.err(),
            Some(HelperError::UnknownArgument {
                helper: "f:fixture".into(),
                argument: "bogus".into()
            })
        );
    }

    #[test]
    fn values_are_coerced_to_the_declared_type() {
        let mut values = IndexMap::new();
        values.insert("each".to_string(), TemplateValue::Array(vec![]));
        values.insert("reverse".to_string(), TemplateValue::String("1".into()));
        let args = bind_arguments(&FixtureHelper, "f:fixture", values).unwrap();
        assert_eq!(args.value("reverse"), TemplateValue::Boolean(true));
    }
}
