//! Per-operation temporary workspace.
//!
//! A [`Workspace`] owns one temporary directory holding the intermediate
//! artifacts of a single operation (extracted segments, backfilled clips,
//! concat lists). It exists for the duration of that operation only and is
//! removed on both the success and failure exit paths; removal failures are
//! logged and never change the operation's outcome.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use reelcut_core::Result;

/// Scratch directory for one operation's intermediate files.
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        Ok(Self { temp_dir })
    }

    /// Path to the workspace directory.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named intermediate file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Remove the workspace, logging (not propagating) any failure.
    pub fn cleanup(self) {
        let path = self.temp_dir.path().to_path_buf();
        if let Err(e) = self.temp_dir.close() {
            tracing::warn!("failed to remove workspace {}: {e}", path.display());
        }
    }
}
