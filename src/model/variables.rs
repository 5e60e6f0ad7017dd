//! Variable providers and dotted-path resolution
//!
//! Variables are held in a scoped stack so loop and partial renders can
//! overlay values without cloning the underlying maps. Providers can be
//! chained into an ordered fallback list; the compiler warmup overlay uses
//! this to supply best-effort defaults without shadowing real values.

use super::value::TemplateValue;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Read access to named variables
///
/// `get_by_path` implements the accessor contract: a missing segment yields
/// `Null`, never an error. That silent-failure behavior is deliberate and
/// covered by tests.
pub trait VariableProvider: Send + Sync {
    /// Look up a top-level variable by name
    fn get(&self, name: &str) -> Option<TemplateValue>;

    /// Whether a top-level variable exists
    fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a dotted path such as `user.address.city`
    fn get_by_path(&self, path: &str) -> TemplateValue {
        let mut segments = path.split('.');
        let Some(head) = segments.next() else {
            return TemplateValue::Null;
        };
        let Some(root) = self.get(head) else {
            return TemplateValue::Null;
        };
        resolve_path(root, segments)
    }
}

/// Resolve the remaining segments of a dotted path against a value
///
/// Per segment the lookup order is: object key first, then numeric index for
/// arrays. Any miss resolves the whole path to `Null`.
pub fn resolve_path<'a, I>(root: TemplateValue, segments: I) -> TemplateValue
where
    I: Iterator<Item = &'a str>,
{
    let mut current = root;
    for segment in segments {
        current = match current {
            TemplateValue::Object(entries) => match entries.get(segment) {
                Some(v) => v.clone(),
                None => return TemplateValue::Null,
            },
            TemplateValue::Array(items) => match segment.parse::<usize>() {
                Ok(index) => match items.get(index) {
                    Some(v) => v.clone(),
                    None => return TemplateValue::Null,
                },
                Err(_) => return TemplateValue::Null,
            },
            _ => return TemplateValue::Null,
        };
    }
    current
}

/// The standard scoped variable container
///
/// Scopes form a stack: lookups walk from the innermost scope outwards,
/// assignments always go to the innermost scope. Interior locking keeps the
/// provider shareable behind `&self` during a render pass; a provider
/// instance belongs to exactly one `RenderingContext` and is never shared
/// across concurrent renders.
#[derive(Debug, Default)]
pub struct StandardVariableProvider {
    scopes: RwLock<Vec<FxHashMap<String, TemplateValue>>>,
}

impl StandardVariableProvider {
    /// Create an empty provider with a single root scope
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(vec![FxHashMap::default()]),
        }
    }

    /// Create a provider seeded with the given root variables
    pub fn from_map(variables: FxHashMap<String, TemplateValue>) -> Self {
        Self {
            scopes: RwLock::new(vec![variables]),
        }
    }

    /// Assign a variable in the innermost scope
    pub fn assign(&self, name: impl Into<String>, value: TemplateValue) {
        let mut scopes = self.scopes.write();
        if let Some(scope) = scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Remove a variable from the innermost scope
    pub fn remove(&self, name: &str) {
        let mut scopes = self.scopes.write();
        if let Some(scope) = scopes.last_mut() {
            scope.remove(name);
        }
    }

    /// Push a fresh scope, optionally seeded with overlay variables
    pub fn push_scope(&self, overlay: FxHashMap<String, TemplateValue>) {
        self.scopes.write().push(overlay);
    }

    /// Pop the innermost scope; the root scope is never popped
    pub fn pop_scope(&self) {
        let mut scopes = self.scopes.write();
        if scopes.len() > 1 {
            scopes.pop();
        }
    }

    /// Snapshot of all visible variables, innermost scope winning
    pub fn flatten(&self) -> FxHashMap<String, TemplateValue> {
        let scopes = self.scopes.read();
        let mut merged = FxHashMap::default();
        for scope in scopes.iter() {
            for (k, v) in scope {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

impl VariableProvider for StandardVariableProvider {
    fn get(&self, name: &str) -> Option<TemplateValue> {
        let scopes = self.scopes.read();
        for scope in scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        None
    }
}

/// Ordered fallback chain of variable providers
///
/// The first provider that knows a name wins. Used by compiler warmup to lay
/// best-effort defaults *under* any variables that are already set.
#[derive(Default)]
pub struct ChainedVariableProvider {
    providers: Vec<Arc<dyn VariableProvider>>,
}

impl ChainedVariableProvider {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Append a provider to the end of the fallback chain
    pub fn push(&mut self, provider: Arc<dyn VariableProvider>) {
        self.providers.push(provider);
    }
}

impl VariableProvider for ChainedVariableProvider {
    fn get(&self, name: &str) -> Option<TemplateValue> {
        self.providers.iter().find_map(|p| p.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider_with(entries: &[(&str, TemplateValue)]) -> StandardVariableProvider {
        let provider = StandardVariableProvider::new();
        for (name, value) in entries {
            provider.assign(*name, value.clone());
        }
        provider
    }

    #[test]
    fn path_resolution_walks_objects_and_arrays() {
        let json = serde_json::json!({"items": [{"name": "first"}, {"name": "second"}]});
        let provider = provider_with(&[("data", TemplateValue::from(json))]);
        assert_eq!(
            provider.get_by_path("data.items.1.name"),
            TemplateValue::from("second")
        );
    }

    #[test]
    fn missing_segments_resolve_silently_to_null() {
        let provider = provider_with(&[("user", TemplateValue::from("Ada"))]);
        assert_eq!(provider.get_by_path("user.missing"), TemplateValue::Null);
        assert_eq!(provider.get_by_path("nothing.at.all"), TemplateValue::Null);
        assert_eq!(provider.get_by_path("user"), TemplateValue::from("Ada"));
    }

    #[test]
    fn scopes_shadow_and_restore() {
        let provider = provider_with(&[("x", TemplateValue::Integer(1))]);
        provider.push_scope(FxHashMap::default());
        provider.assign("x", TemplateValue::Integer(2));
        assert_eq!(provider.get("x"), Some(TemplateValue::Integer(2)));
        provider.pop_scope();
        assert_eq!(provider.get("x"), Some(TemplateValue::Integer(1)));
    }

    #[test]
    fn chained_provider_never_shadows_earlier_values() {
        let primary = Arc::new(provider_with(&[("set", TemplateValue::from("real"))]));
        let defaults = Arc::new(provider_with(&[
            ("set", TemplateValue::from("default")),
            ("only_default", TemplateValue::from("fallback")),
        ]));
        let mut chain = ChainedVariableProvider::new();
        chain.push(primary);
        chain.push(defaults);
        assert_eq!(chain.get("set"), Some(TemplateValue::from("real")));
        assert_eq!(chain.get("only_default"), Some(TemplateValue::from("fallback")));
        assert_eq!(chain.get("absent"), None);
    }
}
