//! Per-invocation working directory.
//!
//! The toolchain expects fixed intermediate file names (`train.csv`,
//! `test.csv`, `to_run.csv`, `test_preds.csv`). Each invocation gets its own
//! freshly created directory so two runs never share those files. The
//! directory is removed when the session drops unless it was created with
//! `keep` set.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};

/// Training partition handed to the trainer.
pub const TRAIN_FILE: &str = "train.csv";
/// Held-out partition handed to the trainer and later classified.
pub const TEST_FILE: &str = "test.csv";
/// Input of a pure prediction run.
pub const TO_RUN_FILE: &str = "to_run.csv";
/// Output written by the classifier.
pub const PREDICTIONS_FILE: &str = "test_preds.csv";

#[derive(Debug)]
enum Dir {
    Temporary(TempDir),
    Kept(PathBuf),
}

/// A unique working directory for one pipeline run.
#[derive(Debug)]
pub struct Session {
    dir: Dir,
}

impl Session {
    /// Create a new session directory below `root`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if `root` cannot be created or the
    /// session directory cannot be allocated.
    pub fn create(root: &Path, keep: bool) -> PipelineResult<Self> {
        fs::create_dir_all(root).map_err(|e| PipelineError::io(root, e))?;
        let temp = tempfile::Builder::new()
            .prefix("senti-")
            .tempdir_in(root)
            .map_err(|e| PipelineError::io(root, e))?;
        let dir = if keep {
            let path = temp.keep();
            info!(path = %path.display(), "keeping working directory");
            Dir::Kept(path)
        } else {
            debug!(path = %temp.path().display(), "created working directory");
            Dir::Temporary(temp)
        };
        Ok(Self { dir })
    }

    /// Root of the session directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        match &self.dir {
            Dir::Temporary(temp) => temp.path(),
            Dir::Kept(path) => path,
        }
    }

    /// Path of `name` inside the session directory.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }
}
