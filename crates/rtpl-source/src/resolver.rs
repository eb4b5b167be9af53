//! Template source lookup.
//!
//! The compiler only ever asks "what is the text for this name?". Where the
//! text lives (disk, an archive, a map built by a test) is up to the
//! [`TemplateResolver`] implementation handed to it.

use std::io;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;

/// Maps a template name such as `pages/welcome.rtpl` to its raw text.
///
/// `None` means the name is unknown. Implementations must not fail in any
/// other way; transport problems are logged and reported as absent.
pub trait TemplateResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<T: TemplateResolver + ?Sized> TemplateResolver for &T {
    fn resolve(&self, name: &str) -> Option<String> {
        (**self).resolve(name)
    }
}

impl<T: TemplateResolver + ?Sized> TemplateResolver for Box<T> {
    fn resolve(&self, name: &str) -> Option<String> {
        (**self).resolve(name)
    }
}

impl<T: TemplateResolver + ?Sized> TemplateResolver for std::sync::Arc<T> {
    fn resolve(&self, name: &str) -> Option<String> {
        (**self).resolve(name)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryResolver {
    templates: FxHashMap<String, String>,
}

impl InMemoryResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.add(name, source);
        self
    }
}

impl TemplateResolver for InMemoryResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.templates.get(name).cloned()
    }
}

/// Resolves names relative to a root directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: Utf8PathBuf,
}

impl DirectoryResolver {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl TemplateResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        let path = self.root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(source) => Some(source),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No template source at {}", path);
                None
            }
            Err(err) => {
                tracing::warn!("Failed to read template {}: {}", path, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod in_memory {
        use super::*;

        #[test]
        fn test_resolve_existing() {
            let resolver = InMemoryResolver::new().with("a.rtpl", "hello");
            assert_eq!(resolver.resolve("a.rtpl").as_deref(), Some("hello"));
        }

        #[test]
        fn test_resolve_missing() {
            let resolver = InMemoryResolver::new();
            assert_eq!(resolver.resolve("missing.rtpl"), None);
        }

        #[test]
        fn test_resolve_through_reference() {
            let resolver = InMemoryResolver::new().with("a.rtpl", "");
            let by_ref: &dyn TemplateResolver = &resolver;
            assert_eq!(by_ref.resolve("a.rtpl").as_deref(), Some(""));
        }
    }

    mod directory {
        use std::fs;

        use tempfile::tempdir;

        use super::*;

        #[test]
        fn test_resolve_nested_file() {
            let dir = tempdir().unwrap();
            fs::create_dir_all(dir.path().join("user")).unwrap();
            fs::write(dir.path().join("user/card.rtag"), "card").unwrap();

            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            let resolver = DirectoryResolver::new(root);
            assert_eq!(resolver.resolve("user/card.rtag").as_deref(), Some("card"));
        }

        #[test]
        fn test_resolve_missing_file() {
            let dir = tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            let resolver = DirectoryResolver::new(root);
            assert_eq!(resolver.resolve("nope.rtpl"), None);
        }
    }
}
