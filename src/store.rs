//! Model artifact storage.
//!
//! Trained models are opaque to this crate. The store only knows that a model
//! named `m` is persisted as `m.model` plus its label-encoder companion
//! `m.model_le`, and moves those files around by name.

use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};

/// Extension of the primary model file.
pub const MODEL_EXTENSION: &str = "model";
/// Extension of the label-encoder file written next to each model.
pub const ENCODER_EXTENSION: &str = "model_le";

/// File names the toolchain produces for `model`.
#[must_use]
pub fn artifact_file_names(model: &str) -> [String; 2] {
    [
        format!("{model}.{MODEL_EXTENSION}"),
        format!("{model}.{ENCODER_EXTENSION}"),
    ]
}

/// Reject names that could escape the registry directory.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidArgument`] for empty names or names with
/// characters outside `[A-Za-z0-9._-]`.
pub fn validate_model_name(name: &str) -> PipelineResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(PipelineError::InvalidArgument(format!(
            "invalid model name \"{name}\""
        )))
    }
}

/// A stored file with the digest recorded when it entered the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    /// SHA-256 as lowercase hexadecimal, when known.
    pub sha256: Option<String>,
}

/// Handle to a named model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub files: Vec<ArtifactFile>,
}

impl ArtifactRef {
    /// Reference a model by name alone, without resolving any files.
    ///
    /// The classifier still receives the name and decides for itself whether
    /// the model exists.
    #[must_use]
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }

    /// Path of the primary `.model` file, if resolved.
    #[must_use]
    pub fn model_path(&self) -> Option<&Path> {
        self.files
            .iter()
            .map(|f| f.path.as_path())
            .find(|p| p.extension().is_some_and(|e| e == MODEL_EXTENSION))
    }
}

/// Put/get/list access to persisted model artifacts.
pub trait ArtifactStore {
    /// Move `files` into the store under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when a file cannot be relocated.
    fn put(&self, name: &str, files: &[PathBuf]) -> PipelineResult<ArtifactRef>;

    /// Look a model up by name.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    fn get(&self, name: &str) -> PipelineResult<Option<ArtifactRef>>;

    /// Names of all stored models, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    fn list(&self) -> PipelineResult<Vec<String>>;
}

/// Store backed by a single flat directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, name: &str, files: &[PathBuf]) -> PipelineResult<ArtifactRef> {
        validate_model_name(name)?;
        fs::create_dir_all(&self.root).map_err(|e| PipelineError::io(&self.root, e))?;
        let mut planned = Vec::with_capacity(files.len());
        for source in files {
            let file_name = source.file_name().ok_or_else(|| {
                PipelineError::InvalidArgument(format!(
                    "artifact path {} has no file name",
                    source.display()
                ))
            })?;
            let sha256 = compute_sha256(source)?;
            planned.push((source, self.root.join(file_name), sha256));
        }

        let mut stored: Vec<ArtifactFile> = Vec::with_capacity(planned.len());
        for (source, target, sha256) in planned {
            if let Err(err) = relocate(source, &target) {
                // Move back what already landed so no half pair is listed.
                for (moved, original) in stored.iter().zip(files) {
                    if let Err(e) = relocate(&moved.path, original) {
                        warn!(path = %moved.path.display(), error = %e, "rollback failed");
                    }
                }
                return Err(err);
            }
            debug!(path = %target.display(), %sha256, "stored artifact file");
            stored.push(ArtifactFile {
                path: target,
                sha256: Some(sha256),
            });
        }
        info!(model = name, dir = %self.root.display(), "stored model artifacts");
        Ok(ArtifactRef {
            name: name.to_owned(),
            files: stored,
        })
    }

    fn get(&self, name: &str) -> PipelineResult<Option<ArtifactRef>> {
        validate_model_name(name)?;
        let files: Vec<ArtifactFile> = artifact_file_names(name)
            .iter()
            .map(|f| self.root.join(f))
            .filter(|p| p.is_file())
            .map(|path| ArtifactFile { path, sha256: None })
            .collect();
        let found = ArtifactRef {
            name: name.to_owned(),
            files,
        };
        Ok(found.model_path().is_some().then_some(found))
    }

    fn list(&self) -> PipelineResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(dir = %self.root.display(), "model directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(PipelineError::io(&self.root, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PipelineError::io(&self.root, e))?.path();
            if !path.is_file() || path.extension().is_none_or(|e| e != MODEL_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Print the name of every stored model, one per line.
///
/// # Errors
///
/// Propagates [`ArtifactStore::list`] failures.
pub fn list_models(store: &impl ArtifactStore) -> PipelineResult<Vec<String>> {
    let names = store.list()?;
    for name in &names {
        println!("{name}");
    }
    Ok(names)
}

fn relocate(source: &Path, target: &Path) -> PipelineResult<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems; fall back to copy and remove.
    fs::copy(source, target).map_err(|e| PipelineError::io(target, e))?;
    fs::remove_file(source).map_err(|e| PipelineError::io(source, e))
}

/// Computes the SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns I/O errors from opening or reading the file.
pub fn compute_sha256(path: &Path) -> PipelineResult<String> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| PipelineError::io(path, e))?;
        let Some(chunk) = buffer.get(..read).filter(|c| !c.is_empty()) else {
            break;
        };
        hasher.update(chunk);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
