//! Extractor registry for routing files to content extractors.

use ragdoc_core::{ContentExtractor, ExtractError, FileType};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::{PdfExtractor, TextExtractor};

/// Registry of content extractors keyed by file type.
pub struct ExtractorRegistry {
    extractors: HashMap<FileType, Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create a registry with the built-in text and PDF extractors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TextExtractor::new());
        registry.register(PdfExtractor::new());
        registry
    }

    /// Register an extractor for every type it supports.
    ///
    /// A later registration replaces an earlier one for the same type.
    pub fn register<E: ContentExtractor + 'static>(&mut self, extractor: E) {
        let extractor: Arc<dyn ContentExtractor> = Arc::new(extractor);
        for file_type in extractor.supported_types() {
            self.extractors.insert(*file_type, Arc::clone(&extractor));
        }
    }

    /// Get the extractor for a file type.
    #[must_use]
    pub fn get(&self, file_type: FileType) -> Option<Arc<dyn ContentExtractor>> {
        self.extractors.get(&file_type).cloned()
    }

    /// Get an extractor that can handle a file, by extension.
    #[must_use]
    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn ContentExtractor>> {
        FileType::from_path(path).and_then(|file_type| self.get(file_type))
    }

    /// Extract the raw text of a file.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extractor = self
            .get_for_file(path)
            .ok_or_else(|| ExtractError::UnsupportedType(extension_of(path)))?;

        extractor.extract(path).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or_else(|| path.display().to_string(), |e| format!(".{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ExtractorRegistry::new();
        assert!(registry.extractors.is_empty());
        for file_type in FileType::ALL {
            assert!(registry.get(file_type).is_none());
        }
    }

    #[test]
    fn test_defaults_cover_all_types() {
        let registry = ExtractorRegistry::default();
        for file_type in FileType::ALL {
            assert!(registry.get(file_type).is_some(), "missing {file_type}");
        }
    }

    #[test]
    fn test_register_maps_every_supported_type() {
        let mut registry = ExtractorRegistry::new();
        registry.register(TextExtractor::new());

        assert!(registry.get(FileType::Markdown).is_some());
        assert!(registry.get(FileType::Text).is_some());
        assert!(registry.get(FileType::Pdf).is_none());
    }

    #[test]
    fn test_get_for_file() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.get_for_file(Path::new("/docs/a.md")).is_some());
        assert!(registry.get_for_file(Path::new("/docs/a.PDF")).is_some());
        assert!(registry.get_for_file(Path::new("/docs/a.xyz")).is_none());
        assert!(registry.get_for_file(Path::new("/docs/noext")).is_none());
    }

    #[tokio::test]
    async fn test_extract_success() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        std::fs::write(&file_path, "Hello, world!").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let text = registry.extract(&file_path).await.unwrap();
        assert_eq!(text, "Hello, world!");
    }

    #[tokio::test]
    async fn test_extract_unsupported_type() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.bin");
        std::fs::write(&file_path, [0u8; 10]).unwrap();

        let registry = ExtractorRegistry::with_defaults();
        match registry.extract(&file_path).await.unwrap_err() {
            ExtractError::UnsupportedType(ext) => assert_eq!(ext, ".bin"),
            other => panic!("Expected UnsupportedType error, got {other:?}"),
        }
    }
}
