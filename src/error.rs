//! Error taxonomy shared by every pipeline stage.
//!
//! Every variant is fatal to the invocation: nothing is retried and no
//! partial results are kept.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors produced while preparing data, invoking the toolchain, or reporting.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input path is missing, not a regular file, or not a readable table.
    #[error("invalid input {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },
    /// The delimiter flag is not one of the supported styles.
    #[error("unknown delimiter style \"{flag}\" (expected \"c\" or \"sc\")")]
    UnknownFormat { flag: String },
    /// An argument is outside its accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An external command exited unsuccessfully.
    #[error("external command `{command}` failed with {}", describe_status(.code))]
    ExternalTool {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The trainer reported success but did not leave its artifacts behind.
    #[error("model artifacts for \"{model}\" not found: {}", display_paths(.missing))]
    ArtifactNotFound { model: String, missing: Vec<PathBuf> },
    /// The classifier output is missing or does not line up with the input.
    #[error("malformed classifier output {path}: {reason}")]
    MalformedOutput { path: PathBuf, reason: String },
    /// Filesystem access failed.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Layered configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Captured output of a failed external command, if this error carries one.
    #[must_use]
    pub fn captured_output(&self) -> Option<(&str, &str)> {
        match self {
            Self::ExternalTool { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }
}

fn describe_status(code: &Option<i32>) -> String {
    code.map_or_else(
        || "no exit code (terminated by signal)".to_owned(),
        |c| format!("exit code {c}"),
    )
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
