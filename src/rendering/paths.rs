//! Template lookup backends

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// Where templates, partials and layouts come from
///
/// Lookup failures are `None`; the caller decides whether a missing template
/// is an error. `available_templates` feeds the compiler warmup pass.
pub trait TemplatePaths: Send + Sync {
    /// Source of a named template
    fn template_source(&self, name: &str) -> Option<String>;

    /// Source of a named partial
    fn partial_source(&self, name: &str) -> Option<String>;

    /// Source of a named layout
    fn layout_source(&self, name: &str) -> Option<String>;

    /// Names of all known templates
    fn available_templates(&self) -> Vec<String>;
}

/// Map-backed template store, mainly for tests and embedded templates
#[derive(Debug, Default)]
pub struct InMemoryTemplates {
    templates: RwLock<FxHashMap<String, String>>,
    partials: RwLock<FxHashMap<String, String>>,
    layouts: RwLock<FxHashMap<String, String>>,
}

impl InMemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.write().insert(name.into(), source.into());
    }

    pub fn add_partial(&self, name: impl Into<String>, source: impl Into<String>) {
        self.partials.write().insert(name.into(), source.into());
    }

    pub fn add_layout(&self, name: impl Into<String>, source: impl Into<String>) {
        self.layouts.write().insert(name.into(), source.into());
    }
}

impl TemplatePaths for InMemoryTemplates {
    fn template_source(&self, name: &str) -> Option<String> {
        self.templates.read().get(name).cloned()
    }

    fn partial_source(&self, name: &str) -> Option<String> {
        self.partials.read().get(name).cloned()
    }

    fn layout_source(&self, name: &str) -> Option<String> {
        self.layouts.read().get(name).cloned()
    }

    fn available_templates(&self) -> Vec<String> {
        self.templates.read().keys().cloned().collect()
    }
}

/// Filesystem-backed template store
///
/// Templates live under `<root>/Templates`, partials under `<root>/Partials`
/// and layouts under `<root>/Layouts`. Names map to `<name>.html` files;
/// read failures are logged and treated as missing.
#[derive(Debug, Clone)]
pub struct FilesystemTemplates {
    root: PathBuf,
}

impl FilesystemTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, subdir: &str, name: &str) -> Option<String> {
        let path = self.root.join(subdir).join(format!("{name}.html"));
        match std::fs::read_to_string(&path) {
            Ok(source) => Some(source),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("failed to read {}: {err}", path.display());
                None
            }
        }
    }
}

impl TemplatePaths for FilesystemTemplates {
    fn template_source(&self, name: &str) -> Option<String> {
        self.read("Templates", name)
    }

    fn partial_source(&self, name: &str) -> Option<String> {
        self.read("Partials", name)
    }

    fn layout_source(&self, name: &str) -> Option<String> {
        self.read("Layouts", name)
    }

    fn available_templates(&self) -> Vec<String> {
        let dir = self.root.join("Templates");
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "html") {
                    path.file_stem()
                        .and_then(|stem| stem.to_str())
                        .map(str::to_string)
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_lookup_round_trips() {
        let store = InMemoryTemplates::new();
        store.add_template("Index", "hello");
        assert_eq!(store.template_source("Index").as_deref(), Some("hello"));
        assert_eq!(store.template_source("Missing"), None);
        assert_eq!(store.available_templates(), vec!["Index".to_string()]);
    }

    #[test]
    fn filesystem_lookup_reads_html_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let templates = dir.path().join("Templates");
        std::fs::create_dir_all(&templates).expect("mkdir");
        std::fs::write(templates.join("Index.html"), "fs hello").expect("write");

        let store = FilesystemTemplates::new(dir.path());
        assert_eq!(store.template_source("Index").as_deref(), Some("fs hello"));
        assert_eq!(store.partial_source("Index"), None);
        assert_eq!(store.available_templates(), vec!["Index".to_string()]);
    }
}
