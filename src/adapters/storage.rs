use crate::domain::ports::Storage;
use crate::utils::error::{LabelError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Filesystem storage rooted at `base_path`. Absolute paths bypass the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    /// Writes into a temporary sibling file and renames it over the target, so a
    /// failed run never leaves a truncated output behind.
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        let write_failure = |source: std::io::Error| LabelError::DocumentWriteFailure {
            path: full_path.display().to_string(),
            source,
        };

        let parent = match full_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        fs::create_dir_all(&parent).map_err(write_failure)?;

        let mut staged = NamedTempFile::new_in(&parent).map_err(write_failure)?;
        staged.write_all(data).map_err(write_failure)?;
        staged.as_file().sync_all().map_err(write_failure)?;
        staged
            .persist(&full_path)
            .map_err(|e| write_failure(e.error))?;

        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}
