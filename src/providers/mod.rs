//! Capability interfaces for the external sentiment toolchain.
//!
//! Training and classification are delegated wholesale to other programs.
//! The pipeline only talks to the [`Trainer`] and [`Classifier`] traits;
//! [`shell`] adapts them to command-line tools, and tests substitute
//! in-process doubles.

pub mod shell;

use std::path::{Path, PathBuf};

use crate::dataset::Dataset;
use crate::error::PipelineResult;
use crate::session::Session;
use crate::split::Split;
use crate::store::ArtifactRef;

/// One classifier output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub id: String,
    pub label: String,
}

/// Predictions read back from a classifier, with the file they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionSet {
    source: PathBuf,
    predictions: Vec<Prediction>,
}

impl PredictionSet {
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, predictions: Vec<Prediction>) -> Self {
        Self {
            source: source.into(),
            predictions,
        }
    }

    /// File the predictions were read from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Produces a named model from a train/test split.
pub trait Trainer {
    /// Train `model` on `split`, working inside `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolchain fails or its artifacts cannot be
    /// stored.
    fn train(&self, session: &Session, split: &Split, model: &str) -> PipelineResult<ArtifactRef>;
}

/// Labels a dataset with a previously trained model.
pub trait Classifier {
    /// Classify every record of `dataset` with `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolchain fails or its output cannot be read.
    fn classify(
        &self,
        session: &Session,
        dataset: &Dataset,
        model: &ArtifactRef,
    ) -> PipelineResult<PredictionSet>;
}
