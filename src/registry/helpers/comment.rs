use crate::ast::ViewHelperNode;
use crate::model::TemplateValue;
use crate::registry::{ArgumentDefinition, Arguments, CompileResult, ViewHelper};
use crate::rendering::{ChildBlock, RenderError, RenderingContext};

/// `f:comment` swallows its children entirely
///
/// The comment processor already blanks the body before parsing, so broken
/// markup inside a comment never reaches the parser. Compilation folds the
/// node away.
pub struct CommentHelper;

impl ViewHelper for CommentHelper {
    fn argument_definitions(&self) -> Vec<ArgumentDefinition> {
        Vec::new()
    }

    fn escapes_children(&self) -> bool {
        false
    }

    fn render(
        &self,
        _args: &Arguments,
        _children: &ChildBlock<'_>,
        _ctx: &mut RenderingContext,
    ) -> Result<TemplateValue, RenderError> {
        Ok(TemplateValue::Null)
    }

    fn compile(&self, _node: &ViewHelperNode) -> CompileResult {
        CompileResult::Replace(TemplateValue::Null)
    }
}
