// Local file storage for uploaded documents

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::documents::Extension;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Storage {
    documents_dir: PathBuf,
}

/// Create the documents, static and chart directories
pub fn ensure_layout(config: &StorageConfig) -> std::io::Result<()> {
    for dir in [config.documents_dir(), config.static_dir(), config.charts_dir()] {
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Ensured directory");
    }
    Ok(())
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Non-ASCII characters are dropped, path separators and whitespace become
/// underscores, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing dots and underscores are trimmed. May return an empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

impl Storage {
    pub fn new(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// Sanitize `filename` and check its extension. Returns the stored name.
    pub fn accept_filename(filename: &str) -> AppResult<(String, Extension)> {
        let name = sanitize_filename(filename);
        match Extension::from_filename(&name) {
            Some(ext) if !name.is_empty() => Ok((name, ext)),
            _ => Err(AppError::Validation("Unsupported file type.".to_string())),
        }
    }

    /// Where an accepted upload named `filename` is stored
    pub fn path_for(&self, filename: &str) -> AppResult<PathBuf> {
        let (name, _) = Self::accept_filename(filename)?;
        Ok(self.documents_dir.join(name))
    }

    /// Write an upload into the documents directory, replacing any file of the same name
    pub async fn save_document(&self, filename: &str, data: &[u8]) -> AppResult<PathBuf> {
        let path = self.path_for(filename)?;
        tokio::fs::create_dir_all(&self.documents_dir).await?;
        tokio::fs::write(&path, data).await?;
        info!(path = %path.display(), bytes = data.len(), "Saved document");
        Ok(path)
    }

    /// Path of a stored document, if `filename` names one
    pub fn document_path(&self, filename: &str) -> Option<PathBuf> {
        let name = sanitize_filename(filename);
        if name.is_empty() || name != filename {
            return None;
        }
        let path = self.documents_dir.join(name);
        path.is_file().then_some(path)
    }

    /// Best-effort removal of stored documents
    pub async fn remove_documents(&self, paths: &[PathBuf]) {
        for path in paths {
            if !path.starts_with(&self.documents_dir) {
                warn!(path = %path.display(), "Refusing to remove file outside documents dir");
                continue;
            }
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Removed document"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove document"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("my data file.csv"), "my_data_file.csv");
        assert_eq!(sanitize_filename("résumé.docx"), "rsum.docx");
        assert_eq!(sanitize_filename("..\\..\\x.txt"), "x.txt");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_accept_filename() {
        assert_eq!(Storage::accept_filename("a b.CSV").unwrap().0, "a_b.CSV");
        assert!(Storage::accept_filename("run.sh").is_err());
        assert!(Storage::accept_filename("..").is_err());
        assert!(Storage::accept_filename("notes").is_err());
    }

    #[tokio::test]
    async fn test_save_and_lookup() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("documents"));

        let path = storage.save_document("hello world.txt", b"hello").await.unwrap();
        assert_eq!(path, dir.path().join("documents").join("hello_world.txt"));
        assert_eq!(storage.path_for("hello world.txt").unwrap(), path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");

        assert_eq!(storage.document_path("hello_world.txt"), Some(path.clone()));
        assert_eq!(storage.document_path("hello world.txt"), None);
        assert_eq!(storage.document_path("../documents/hello_world.txt"), None);
        assert_eq!(storage.document_path("missing.txt"), None);

        storage.remove_documents(&[path.clone()]).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        storage.save_document("a.txt", b"first").await.unwrap();
        let path = storage.save_document("a.txt", b"second").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_remove_ignores_outside_paths() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, "x").unwrap();
        let storage = Storage::new(dir.path().join("documents"));
        storage.remove_documents(&[outside.clone()]).await;
        assert!(outside.exists());
    }

    #[test]
    fn test_ensure_layout() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            base_dir: dir.path().to_path_buf(),
        };
        ensure_layout(&config).unwrap();
        assert!(config.documents_dir().is_dir());
        assert!(config.charts_dir().is_dir());
    }
}
