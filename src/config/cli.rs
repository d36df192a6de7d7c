use crate::core::Storage;
use crate::utils::error::{Result, SplitError};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Reads and writes relative to `base_path`; absolute paths are used as given.
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
        tokio::fs::read(&full_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SplitError::FileNotFound {
                path: path.to_string(),
            },
            _ => SplitError::Io(e),
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<()> {
        match tokio::fs::remove_file(self.resolve(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SplitError::Io(e)),
        }
    }
}
