//! End-to-end train, predict and list operations.
//!
//! Each operation runs in its own [`Session`] so intermediate files never
//! leak between invocations. The toolchain is reached only through the
//! [`Trainer`] and [`Classifier`] traits and models only through an
//! [`ArtifactStore`].

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Settings;
use crate::dataset::{ColumnMapping, Delimiter, LabelMode, load};
use crate::error::PipelineResult;
use crate::providers::shell::{ShellClassifier, ShellTrainer};
use crate::providers::{Classifier, Trainer};
use crate::report::{ClassificationReport, ReportRow, merge, write_report};
use crate::session::Session;
use crate::split::split_dataset;
use crate::store::{ArtifactRef, ArtifactStore, FsArtifactStore, list_models};

/// Default fraction of records held out for evaluation.
pub const DEFAULT_TEST_SPLIT: f64 = 0.3;

/// Where and how to read the input dataset.
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub path: PathBuf,
    pub delimiter: Delimiter,
    pub columns: ColumnMapping,
}

/// Where to write results.
#[derive(Debug, Clone, Default)]
pub struct OutputSpec {
    /// Report rows as CSV.
    pub report: Option<PathBuf>,
    /// Classification metrics as JSON.
    pub metrics: Option<PathBuf>,
}

/// Arguments of a training run.
#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub input: InputSpec,
    pub model: String,
    pub test_split: f64,
    pub seed: Option<u64>,
    pub output: OutputSpec,
}

/// Arguments of a prediction run.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub input: InputSpec,
    pub model: String,
    pub output: OutputSpec,
}

/// What a train or predict run produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The freshly trained model, for training runs.
    pub artifact: Option<ArtifactRef>,
    pub rows: Vec<ReportRow>,
    /// Present whenever ground truth was available.
    pub report: Option<ClassificationReport>,
}

/// Pipeline wired to a store, a trainer and a classifier.
#[derive(Debug)]
pub struct Pipeline<S, T, C> {
    store: S,
    trainer: T,
    classifier: C,
    work_root: PathBuf,
    keep_work_dir: bool,
}

/// Pipeline backed by the shell toolchain and the filesystem store.
pub type ShellPipeline = Pipeline<FsArtifactStore, ShellTrainer<FsArtifactStore>, ShellClassifier>;

impl ShellPipeline {
    /// Build the command-line pipeline described by `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let store = FsArtifactStore::new(&settings.models_dir);
        let trainer = ShellTrainer::new(settings.train_template(), &settings.tool_dir, store.clone());
        let classifier = ShellClassifier::new(settings.classify_template(), &settings.tool_dir);
        Pipeline::new(store, trainer, classifier, settings.work_root())
            .keep_work_dir(settings.keep_work_dir)
    }
}

impl<S, T, C> Pipeline<S, T, C>
where
    S: ArtifactStore,
    T: Trainer,
    C: Classifier,
{
    #[must_use]
    pub fn new(store: S, trainer: T, classifier: C, work_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            trainer,
            classifier,
            work_root: work_root.into(),
            keep_work_dir: false,
        }
    }

    /// Keep session directories after each run.
    #[must_use]
    pub fn keep_work_dir(mut self, keep: bool) -> Self {
        self.keep_work_dir = keep;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Train a model, then classify the held-out partition with it and
    /// report on the result.
    ///
    /// # Errors
    ///
    /// Propagates normalisation, splitting, toolchain, store and report
    /// errors; the first failure aborts the run.
    pub fn train(&self, request: &TrainRequest) -> PipelineResult<Outcome> {
        let dataset = load(
            &request.input.path,
            request.input.delimiter,
            &request.input.columns,
            LabelMode::Required,
        )?;
        let split = split_dataset(&dataset, request.test_split, request.seed)?;
        info!(
            model = %request.model,
            train = split.train.len(),
            test = split.test.len(),
            "training model"
        );

        let session = Session::create(&self.work_root, self.keep_work_dir)?;
        let artifact = self.trainer.train(&session, &split, &request.model)?;
        let predictions = self.classifier.classify(&session, &split.test, &artifact)?;
        let rows = merge(&predictions, &split.test)?;
        let report = finish(&rows, &request.output)?;
        Ok(Outcome {
            artifact: Some(artifact),
            rows,
            report,
        })
    }

    /// Classify a dataset with a stored model.
    ///
    /// A label column, when present, is used as ground truth for the
    /// quality summary. An unknown model is still handed to the classifier,
    /// which is expected to fail.
    ///
    /// # Errors
    ///
    /// Propagates normalisation, toolchain and report errors.
    pub fn predict(&self, request: &PredictRequest) -> PipelineResult<Outcome> {
        let dataset = load(
            &request.input.path,
            request.input.delimiter,
            &request.input.columns,
            LabelMode::Optional,
        )?;
        let model = self.store.get(&request.model)?.unwrap_or_else(|| {
            warn!(model = %request.model, "model not found in store");
            ArtifactRef::unresolved(&request.model)
        });
        info!(model = %model.name, records = dataset.len(), "classifying dataset");

        let session = Session::create(&self.work_root, self.keep_work_dir)?;
        let predictions = self.classifier.classify(&session, &dataset, &model)?;
        let rows = merge(&predictions, &dataset)?;
        let report = finish(&rows, &request.output)?;
        Ok(Outcome {
            artifact: None,
            rows,
            report,
        })
    }

    /// Print and return the names of stored models.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub fn list(&self) -> PipelineResult<Vec<String>> {
        list_models(&self.store)
    }
}

fn finish(rows: &[ReportRow], output: &OutputSpec) -> PipelineResult<Option<ClassificationReport>> {
    if let Some(path) = &output.report {
        write_report(path, rows)?;
        println!("Wrote output file to {}", path.display());
    }
    let report = ClassificationReport::from_rows(rows);
    match &report {
        Some(report) => {
            println!("{report}");
            if let Some(path) = &output.metrics {
                report.write_json(path)?;
                info!(path = %path.display(), "wrote metrics");
            }
        }
        None => info!("no ground truth available, skipping quality summary"),
    }
    Ok(report)
}
