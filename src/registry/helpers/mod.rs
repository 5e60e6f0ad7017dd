//! Builtin helpers of the core `f` namespace

mod comment;
mod condition;
mod format;
mod iteration;
mod layout;
mod resource;
mod structure;

pub use comment::CommentHelper;
pub use condition::IfHelper;
pub use format::{HtmlspecialcharsHelper, RawHelper};
pub use iteration::{CycleHelper, ForHelper};
pub use layout::{LayoutHelper, RenderHelper, SectionHelper};
pub use resource::ResourceUriHelper;
pub use structure::{AliasHelper, CountHelper};

use super::ViewHelper;
use std::sync::Arc;

/// The helpers pre-registered under the `f` namespace
pub fn builtin_helpers() -> Vec<(&'static str, Arc<dyn ViewHelper>)> {
    vec![
        ("comment", Arc::new(CommentHelper) as Arc<dyn ViewHelper>),
        ("if", Arc::new(IfHelper)),
        ("for", Arc::new(ForHelper)),
        ("cycle", Arc::new(CycleHelper)),
        ("alias", Arc::new(AliasHelper)),
        ("count", Arc::new(CountHelper)),
        ("format.raw", Arc::new(RawHelper)),
        ("format.htmlspecialchars", Arc::new(HtmlspecialcharsHelper)),
        ("section", Arc::new(SectionHelper)),
        ("layout", Arc::new(LayoutHelper)),
        ("render", Arc::new(RenderHelper)),
        ("uri.resource", Arc::new(ResourceUriHelper)),
    ]
}
