//! Template compilation driver

use super::cache::{TemplateCache, fingerprint};
use super::program::{CompilationFailure, CompiledProgram};
use crate::ast::SyntaxNode;
use crate::model::{
    ChainedVariableProvider, StandardVariableProvider, TemplateValue, VariableProvider,
};
use crate::parser::{ParseResult, TemplateParser};
use crate::registry::HelperResolver;
use crate::rendering::{ParsedTemplate, TemplatePaths};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Lifecycle of one template in the compiler
#[derive(Debug, Clone, PartialEq)]
pub enum CompilerState {
    /// Not seen yet
    Idle,
    /// Compilation in progress
    Compiling,
    /// Compiled and cached
    Compiled,
    /// Compilation failed; the interpreted form is cached instead and the
    /// diagnostic stays retrievable per identifier
    Failed(CompilationFailure),
}

/// Parses, compiles and caches templates by source fingerprint
///
/// Compilation failure is never fatal: the interpreted template is cached
/// and rendered instead, and the failure reason is kept for diagnostics.
pub struct TemplateCompiler {
    resolver: Arc<HelperResolver>,
    cache: Arc<dyn TemplateCache>,
    states: DashMap<String, CompilerState>,
}

impl TemplateCompiler {
    pub fn new(resolver: Arc<HelperResolver>, cache: Arc<dyn TemplateCache>) -> Self {
        Self {
            resolver,
            cache,
            states: DashMap::new(),
        }
    }

    pub fn resolver(&self) -> &Arc<HelperResolver> {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<dyn TemplateCache> {
        &self.cache
    }

    /// Compiler state of a template identifier
    pub fn state(&self, identifier: &str) -> CompilerState {
        self.states
            .get(identifier)
            .map(|state| state.clone())
            .unwrap_or(CompilerState::Idle)
    }

    /// Fetch the template for a source, parsing and compiling on first use
    pub fn fetch(&self, source: &str) -> ParseResult<Arc<ParsedTemplate>> {
        let identifier = fingerprint(source);
        if let Some(hit) = self.cache.get(&identifier) {
            log::trace!("cache hit for {identifier}");
            return Ok(hit);
        }

        let parsed = TemplateParser::new(self.resolver.clone()).parse(source)?;
        let stored = Arc::new(self.compile_or_keep(&identifier, parsed));
        self.cache.set(&identifier, stored.clone());
        Ok(stored)
    }

    /// Compile a parsed template, falling back to the interpreted form when
    /// the template is not compilable
    fn compile_or_keep(&self, identifier: &str, parsed: ParsedTemplate) -> ParsedTemplate {
        if !parsed.is_compilable() {
            let failure = CompilationFailure {
                reason: "compiling is disabled for this template".to_string(),
                mitigations: vec!["remove the {parsing off} directive".to_string()],
            };
            self.states
                .insert(identifier.to_string(), CompilerState::Failed(failure));
            return parsed;
        }
        self.states
            .insert(identifier.to_string(), CompilerState::Compiling);
        match self.compile(identifier, &parsed) {
            Ok(program) => {
                self.states
                    .insert(identifier.to_string(), CompilerState::Compiled);
                ParsedTemplate::from_program(program)
            }
            Err(failure) => {
                log::debug!("{identifier} stays interpreted: {failure}");
                for mitigation in &failure.mitigations {
                    log::debug!("{identifier} mitigation: {mitigation}");
                }
                self.states
                    .insert(identifier.to_string(), CompilerState::Failed(failure));
                parsed
            }
        }
    }

    /// Fold a parsed template into a compiled program
    pub fn compile(
        &self,
        identifier: &str,
        parsed: &ParsedTemplate,
    ) -> Result<CompiledProgram, CompilationFailure> {
        let Some(root) = parsed.root() else {
            return Err(CompilationFailure {
                reason: "passthrough templates have no tree to compile".to_string(),
                mitigations: vec!["remove the {parsing off} directive".to_string()],
            });
        };
        let sections = parsed
            .sections()
            .iter()
            .map(|(name, nodes)| (name.clone(), nodes.as_ref().clone()));
        CompiledProgram::build(
            identifier,
            root,
            sections,
            parsed.layout_node().cloned(),
            &self.resolver,
        )
    }

    /// Pre-compile every template a path backend knows about
    ///
    /// Dynamic layout names are resolved against the render variables first
    /// and the warmup overlay second, so the overlay supplies defaults
    /// without shadowing real values. Individual failures are logged and
    /// skipped; the return value counts successfully cached templates.
    pub fn warm_up(
        &self,
        paths: &dyn TemplatePaths,
        overlay: FxHashMap<String, TemplateValue>,
    ) -> usize {
        let mut defaults = ChainedVariableProvider::new();
        defaults.push(Arc::new(StandardVariableProvider::new()));
        defaults.push(Arc::new(StandardVariableProvider::from_map(overlay)));

        let mut cached = 0;
        for name in paths.available_templates() {
            let Some(source) = paths.template_source(&name) else {
                continue;
            };
            let identifier = fingerprint(&source);
            if self.cache.has(&identifier) {
                cached += 1;
                continue;
            }
            let parsed = match TemplateParser::new(self.resolver.clone()).parse(&source) {
                Ok(parsed) => parsed,
                Err(err) => {
                    log::warn!("warmup skipped {name}: {err}");
                    continue;
                }
            };
            if let Some(SyntaxNode::ObjectAccessor(path)) = parsed.layout_node()
                && defaults.get_by_path(path).is_null()
            {
                log::warn!("warmup cannot resolve layout name '{{{path}}}' of {name}");
            }
            let stored = Arc::new(self.compile_or_keep(&identifier, parsed));
            self.cache.set(&identifier, stored);
            cached += 1;
        }
        cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::cache::MemoryCache;
    use crate::rendering::InMemoryTemplates;

    fn compiler() -> TemplateCompiler {
        TemplateCompiler::new(
            Arc::new(HelperResolver::standard()),
            Arc::new(MemoryCache::new()),
        )
    }

    #[test]
    fn fetch_compiles_and_caches() {
        let compiler = compiler();
        let first = compiler.fetch("hello {name}").expect("parse");
        assert!(first.is_compiled());
        assert_eq!(
            compiler.state(&fingerprint("hello {name}")),
            CompilerState::Compiled
        );
        let second = compiler.fetch("hello {name}").expect("parse");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn passthrough_templates_stay_interpreted() {
        let compiler = compiler();
        let parsed = compiler.fetch("{parsing off}{x}").expect("parse");
        assert!(parsed.is_passthrough());
        assert!(!parsed.is_compiled());
        assert!(matches!(
            compiler.state(&fingerprint("{parsing off}{x}")),
            CompilerState::Failed(_)
        ));
    }

    #[test]
    fn failed_state_keeps_the_diagnostic() {
        let compiler = compiler();
        compiler.fetch("{parsing off}{x}").expect("parse");
        match compiler.state(&fingerprint("{parsing off}{x}")) {
            CompilerState::Failed(failure) => {
                assert!(!failure.reason.is_empty());
                assert!(!failure.mitigations.is_empty());
            }
            other => panic!("expected a failed state, got {other:?}"),
        }
    }

    #[test]
    fn warm_up_fills_the_cache_from_available_templates() {
        let compiler = compiler();
        let store = InMemoryTemplates::new();
        store.add_template("One", "static one");
        store.add_template("Two", "value: {v}");
        let cached = compiler.warm_up(&store, FxHashMap::default());
        assert_eq!(cached, 2);
        assert!(compiler.cache().has(&fingerprint("static one")));
        assert!(compiler.cache().has(&fingerprint("value: {v}")));
    }
}
