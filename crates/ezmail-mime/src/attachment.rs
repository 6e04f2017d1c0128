//! Attachment sources and the file-access contract.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A file to attach, optionally under a different display name.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachment {
    /// Name shown to the recipient; defaults to the file name of `path`.
    pub name: Option<String>,
    /// Where the content is read from.
    pub path: PathBuf,
}

impl Attachment {
    /// Attaches `path` under its own file name.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            path: path.into(),
        }
    }

    /// Attaches `path` under `name`.
    #[must_use]
    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: Some(name.into()),
            path: path.into(),
        }
    }

    /// Returns the name used in the part headers.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map_or_else(
                    || self.path.to_string_lossy(),
                    |name| name.to_string_lossy(),
                )
                .into_owned()
        })
    }
}

/// Reads attachment content.
#[allow(async_fn_in_trait)]
pub trait FileReader {
    /// Reads the whole source into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the source is unreadable.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`FileReader`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileReader;

impl FileReader for FsFileReader {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|source| Error::Attachment {
            path: path.to_path_buf(),
            source,
        })
    }
}
