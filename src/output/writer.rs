//! Filesystem output for exported pages

use crate::BackupError;
use std::fs;
use std::path::Path;

/// Writes exported files below a backup root
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportWriter;

impl ExportWriter {
    /// Creates `path` and any missing parents
    pub fn ensure_dir(&self, path: &Path) -> crate::Result<()> {
        fs::create_dir_all(path).map_err(|source| BackupError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes `content` to `path`, replacing an existing file
    ///
    /// Missing parent directories are created first.
    pub fn write(&self, path: &Path, content: &str) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }

        fs::write(path, content).map_err(|source| BackupError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
