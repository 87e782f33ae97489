//! Resource loading for templates and style sheets.
//!
//! Manifests refer to template and style files by path. Where the text comes
//! from is up to a [`ResourceLoader`]:
//!
//! - [`FileLoader`] reads files below a root directory
//! - [`MemoryLoader`] serves registered strings, handy for tests and for
//!   resources compiled into the binary with `include_str!`

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::LoadError;

/// Source of template and style text.
pub trait ResourceLoader {
    fn load(&self, path: &str) -> Result<String, LoadError>;
}

/// Loads resources from files under a root directory.
///
/// Paths are relative to the root; absolute paths and `..` segments are
/// rejected as not found.
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|part| !matches!(part, Component::Normal(_) | Component::CurDir));
        (!escapes).then(|| self.root.join(relative))
    }
}

impl ResourceLoader for FileLoader {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        let full = self
            .resolve(path)
            .ok_or_else(|| LoadError::NotFound(path.to_string()))?;
        if !full.is_file() {
            return Err(LoadError::NotFound(path.to_string()));
        }
        fs::read_to_string(&full).map_err(|source| LoadError::Io {
            path: full.display().to_string(),
            source,
        })
    }
}

/// Serves resources from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.entries.insert(path.into(), content.into());
        self
    }

    pub fn with(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<String, LoadError> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_loader_reads_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("counter")).unwrap();
        fs::write(dir.path().join("counter/view.html"), "<p>{{ this.n }}</p>").unwrap();

        let loader = FileLoader::new(dir.path());
        assert_eq!(loader.load("counter/view.html").unwrap(), "<p>{{ this.n }}</p>");
        assert_eq!(loader.load("./counter/view.html").unwrap(), "<p>{{ this.n }}</p>");
    }

    #[test]
    fn test_file_loader_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = FileLoader::new(dir.path()).load("nope.html").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(path) if path == "nope.html"));
    }

    #[test]
    fn test_file_loader_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let loader = FileLoader::new(dir.path().join("inner"));
        fs::write(dir.path().join("secret.txt"), "x").unwrap();
        assert!(loader.load("../secret.txt").is_err());
        assert!(loader.load("/etc/hostname").is_err());
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with("a.css", "p {}");
        assert_eq!(loader.load("a.css").unwrap(), "p {}");
        assert!(loader.load("b.css").is_err());
    }
}
