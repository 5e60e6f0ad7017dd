//! Namespace and helper resolution

use super::ViewHelper;
use super::helpers;
use crate::parser::{ParseError, ParseResult};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Maps namespace aliases to package paths and helper names to
/// implementations
///
/// Interior mutability lets the namespace detection processor register
/// declarations while a shared parse is running. Ignored namespaces support
/// trailing/leading `*` wildcards, so `{namespace foo}` and patterns like
/// `x*` both leave matching markup untouched.
pub struct HelperResolver {
    namespaces: RwLock<FxHashMap<String, String>>,
    ignored: RwLock<Vec<String>>,
    helpers: RwLock<FxHashMap<(String, String), Arc<dyn ViewHelper>>>,
}

impl HelperResolver {
    /// An empty resolver with no namespaces at all
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(FxHashMap::default()),
            ignored: RwLock::new(Vec::new()),
            helpers: RwLock::new(FxHashMap::default()),
        }
    }

    /// The standard resolver: namespace `f` with the builtin helper set
    pub fn standard() -> Self {
        let resolver = Self::new();
        resolver.register_namespace("f", "Vellum.Core");
        for (name, helper) in helpers::builtin_helpers() {
            resolver.register_helper("f", name, helper);
        }
        resolver
    }

    /// Register (or re-point) a namespace alias
    pub fn register_namespace(&self, alias: &str, package_path: &str) {
        self.namespaces
            .write()
            .insert(alias.to_string(), package_path.to_string());
    }

    /// Mark an alias pattern as ignored; matching markup is treated as text
    pub fn ignore_namespace(&self, pattern: &str) {
        let mut ignored = self.ignored.write();
        if !ignored.iter().any(|p| p == pattern) {
            ignored.push(pattern.to_string());
        }
    }

    /// Whether the alias is registered to a package
    pub fn is_namespace_valid(&self, alias: &str) -> bool {
        self.namespaces.read().contains_key(alias)
    }

    /// Whether the alias matches an ignore pattern
    pub fn is_namespace_ignored(&self, alias: &str) -> bool {
        self.ignored
            .read()
            .iter()
            .any(|pattern| wildcard_match(pattern, alias))
    }

    /// The package path an alias points at
    pub fn namespace_package(&self, alias: &str) -> Option<String> {
        self.namespaces.read().get(alias).cloned()
    }

    /// Register a helper implementation under `namespace:name`
    pub fn register_helper(
        &self,
        namespace: &str,
        name: &str,
        helper: Arc<dyn ViewHelper>,
    ) {
        self.helpers
            .write()
            .insert((namespace.to_string(), name.to_string()), helper);
    }

    /// Resolve a helper; unresolvable helpers in a valid namespace are a
    /// parse error
    pub fn resolve(&self, namespace: &str, name: &str) -> ParseResult<Arc<dyn ViewHelper>> {
        self.helpers
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ParseError::UnresolvableHelper {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

impl Default for HelperResolver {
    fn default() -> Self {
        Self::standard()
    }
}

fn wildcard_match(pattern: &str, alias: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == alias,
        Some((prefix, suffix)) => {
            alias.len() >= prefix.len() + suffix.len()
                && alias.starts_with(prefix)
                && alias.ends_with(suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_resolver_knows_the_core_namespace() {
        let resolver = HelperResolver::standard();
        assert!(resolver.is_namespace_valid("f"));
        assert_eq!(resolver.namespace_package("f").as_deref(), Some("Vellum.Core"));
    }

    #[test]
    fn builtin_helpers_resolve() {
        let resolver = HelperResolver::standard();
        assert!(resolver.resolve("f", "if").is_ok());
        assert!(resolver.resolve("f", "for").is_ok());
        assert!(resolver.resolve("f", "format.raw").is_ok());
        assert!(resolver.resolve("f", "uri.resource").is_ok());
    }

    #[test]
    fn unresolvable_helper_is_a_parse_error() {
        let resolver = HelperResolver::standard();
        assert_eq!(
            resolver.resolve("f", "nope").err(),
            Some(ParseError::UnresolvableHelper {
                namespace: "f".into(),
                name: "nope".into()
            })
        );
    }

    #[test]
    fn wildcard_ignore_patterns_match_prefixes() {
        let resolver = HelperResolver::new();
        resolver.ignore_namespace("x*");
        assert!(resolver.is_namespace_ignored("x"));
        assert!(resolver.is_namespace_ignored("xyz"));
        assert!(!resolver.is_namespace_ignored("yx"));
    }
}
