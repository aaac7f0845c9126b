//! Core library entry point.
//!
//! Prepares labelled text datasets, drives an external sentiment toolchain
//! through the [`Trainer`] and [`Classifier`] interfaces, and turns its
//! output into evaluation-ready reports.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod session;
pub mod split;
pub mod store;

#[cfg(feature = "cli")]
pub use cli::SentiArgs;
pub use config::{ConfigError, Settings};
pub use dataset::{ColumnMapping, Dataset, Delimiter, LabelMode, Record};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PredictRequest, ShellPipeline, TrainRequest};
pub use providers::{Classifier, Prediction, PredictionSet, Trainer};
pub use report::{ClassificationReport, ReportRow};
pub use session::Session;
pub use split::{Split, split_dataset};
pub use store::{ArtifactRef, ArtifactStore, FsArtifactStore};
