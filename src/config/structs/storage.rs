//! Storage configuration structures.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{BloggerError, Result};

/// Storage configuration.
///
/// # Example
/// ```toml
/// [storage]
/// entries_dir = "/home/me/blog/entries"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding generated entries and the index file.
    ///
    /// Defaults to `<data dir>/devblogger/entries` (platform-dependent).
    #[serde(default)]
    pub entries_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolves the effective entries directory.
    pub fn resolve_entries_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.entries_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "devblogger")
            .map(|dirs| dirs.data_dir().join("entries"))
            .ok_or_else(|| {
                BloggerError::Config("Could not determine data directory".to_string())
            })
    }
}
