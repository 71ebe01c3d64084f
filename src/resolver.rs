//! Input source classification

use crate::error::{LogdiffError, Result};
use std::path::{Path, PathBuf};

/// An input file and how its records are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Compacted JSON snapshot (`.json`)
    Snapshot(PathBuf),
    /// CSV table snapshot (`.csv`)
    Table(PathBuf),
    /// Anything else is scanned as a log
    Log(PathBuf),
}

impl SourceRef {
    /// Classify `path` by its extension
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Self::Snapshot(path),
            Some("csv") => Self::Table(path),
            _ => Self::Log(path),
        }
    }

    /// Classify `path` and check that it exists
    pub fn resolve(path: impl Into<PathBuf>) -> Result<Self> {
        let source = Self::from_path(path);
        if !source.path().is_file() {
            return Err(LogdiffError::InputNotFound {
                path: source.path().to_path_buf(),
            });
        }
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Snapshot(path) | Self::Table(path) | Self::Log(path) => path,
        }
    }

    /// Name used for record stores and diagnostics
    pub fn display_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}
