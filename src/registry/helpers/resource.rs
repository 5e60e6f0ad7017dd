use crate::model::TemplateValue;
use crate::registry::{ArgumentDefinition, ArgumentType, Arguments, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext};

/// `f:uri.resource` resolves a package-relative resource path to a public
/// URI
///
/// The resource interceptor rewrites literal `Pkg.Name/Public/...` paths in
/// text into invocations of this helper, so both spellings resolve the same
/// way.
pub struct ResourceUriHelper;

impl ViewHelper for ResourceUriHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        vec![
            ArgumentDefinition::required("path", ArgumentType::String, "path below Public/"),
            ArgumentDefinition::optional(
                "package",
                ArgumentType::String,
                "dotted package key owning the resource",
            ),
        ]
    }

    fn render(
        &self,
        args: &Arguments,
        _children: &ChildBlock<'_>,
        ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        let path = args.required_string("path").map_err(RenderError::from)?;
        let base = ctx.resource_base().trim_end_matches('/').to_string();
        let uri = match args.string("package") {
            Some(package) if !package.is_empty() => {
                format!("{base}/{}/Public/{path}", package.replace('.', "/"))
            }
            _ => format!("{base}/Public/{path}"),
        };
        Ok(TemplateValue::String(uri))
    }
}
