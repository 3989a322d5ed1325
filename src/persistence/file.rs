//! Local file channel.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::persistence::{ChannelError, FileKind, PersistenceChannel};

/// Stores the persisted bytes in a single file.
///
/// Writes go to a sibling temp file first and are renamed over the target,
/// so readers never observe a half-written file.
#[derive(Debug, Clone)]
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Channel for `kind` inside `dir`.
    pub fn in_dir(dir: &Path, kind: FileKind) -> Self {
        Self::new(dir.join(kind.file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistenceChannel for FileChannel {
    fn exists(&self) -> Result<bool, ChannelError> {
        Ok(self.path.try_exists()?)
    }

    fn read(&self) -> Result<Vec<u8>, ChannelError> {
        fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ChannelError::NotFound,
            _ => ChannelError::Io(e),
        })
    }

    fn write(&self, bytes: &[u8]) -> Result<(), ChannelError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &self.path)?;

        tracing::debug!(path = ?self.path, bytes = bytes.len(), "Persisted configuration");
        Ok(())
    }
}
