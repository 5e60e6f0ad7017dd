//! Per-parse state
//!
//! A `ParsingState` lives for exactly one parse call. It owns the open-node
//! stack bookkeeping the parser exposes to interceptors and post-parse
//! hooks, plus the variable container for values collected *during parsing*
//! (layout name discovery, section registration) as opposed to rendering.

use crate::ast::SyntaxNode;
use crate::model::TemplateValue;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Mutable state threaded through one structural parse
#[derive(Debug, Default)]
pub struct ParsingState {
    /// Variables collected during parsing, not during rendering
    pub variables: FxHashMap<String, TemplateValue>,
    /// Named sections captured by their defining helper
    pub sections: IndexMap<String, Arc<Vec<SyntaxNode>>>,
    /// Layout name node, when the template requested a layout
    pub layout: Option<SyntaxNode>,
    /// Whether automatic output escaping is active for this template
    pub escaping_enabled: bool,
    /// Cleared when a helper vetoes compilation of the whole template
    pub compilable: bool,
    /// Current depth of the open-node stack (maintained by the parser)
    pub stack_depth: usize,
}

impl ParsingState {
    /// Fresh state with escaping on and compilation allowed
    pub fn new() -> Self {
        Self {
            variables: FxHashMap::default(),
            sections: IndexMap::new(),
            layout: None,
            escaping_enabled: true,
            compilable: true,
            stack_depth: 0,
        }
    }

    /// Register a named section discovered at parse time
    pub fn add_section(&mut self, name: impl Into<String>, children: Vec<SyntaxNode>) {
        self.sections.insert(name.into(), Arc::new(children));
    }

    /// Record the layout request of this template
    pub fn set_layout(&mut self, node: SyntaxNode) {
        self.layout = Some(node);
    }
}
