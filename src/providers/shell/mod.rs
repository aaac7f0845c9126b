//! Command-line adapters for the external toolchain.
//!
//! Commands run inside the session directory, and file placeholders expand
//! to absolute paths within it so templates may `cd` elsewhere. The trainer
//! receives `train.csv` and `test.csv` and must leave `<model>.model` and
//! `<model>.model_le` in the session directory. The classifier receives a
//! dataset file, a model reference and an output path, and must write a
//! table with `ID` and `PREDICTED` columns.
mod command;

pub use command::{CommandOutput, CommandTemplate, run, shell_quote};

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{Classifier, Prediction, PredictionSet, Trainer};
use crate::dataset::{Dataset, Delimiter, Record, read_table, write_table};
use crate::error::{PipelineError, PipelineResult};
use crate::session::{PREDICTIONS_FILE, Session, TEST_FILE, TO_RUN_FILE, TRAIN_FILE};
use crate::split::Split;
use crate::store::{ArtifactRef, ArtifactStore, artifact_file_names, validate_model_name};

/// Ground-truth column name expected by the toolchain.
pub const POLARITY_COLUMN: &str = "polarity";
/// Identifier column written by the classifier.
pub const OUTPUT_ID_COLUMN: &str = "ID";
/// Predicted label column written by the classifier.
pub const OUTPUT_PREDICTED_COLUMN: &str = "PREDICTED";
/// Folder some classifier builds write their output into.
pub const PREDICTIONS_DIR: &str = "predictions";

/// Placeholders understood by training templates.
pub const TRAIN_PLACEHOLDERS: &[&str] = &["tool_dir", "train", "test", "model"];
/// Placeholders understood by classification templates.
pub const CLASSIFY_PLACEHOLDERS: &[&str] = &["tool_dir", "input", "model", "model_path", "output"];

/// Write `records` in the toolchain's input layout.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] when the file cannot be written.
pub fn write_tool_input(path: &Path, records: &[Record], with_labels: bool) -> PipelineResult<()> {
    let headers: &[&str] = if with_labels {
        &["id", "text", POLARITY_COLUMN]
    } else {
        &["id", "text"]
    };
    let rows = records.iter().map(|r| {
        let mut row = vec![r.id.as_str(), r.text.as_str()];
        if with_labels {
            row.push(r.label.as_deref().unwrap_or_default());
        }
        row
    });
    write_table(path, headers, rows)
}

/// Trainer that shells out to a training script.
#[derive(Debug, Clone)]
pub struct ShellTrainer<S> {
    template: CommandTemplate,
    tool_dir: PathBuf,
    store: S,
}

impl<S: ArtifactStore> ShellTrainer<S> {
    #[must_use]
    pub fn new(template: CommandTemplate, tool_dir: impl Into<PathBuf>, store: S) -> Self {
        Self {
            template,
            tool_dir: tool_dir.into(),
            store,
        }
    }
}

impl<S: ArtifactStore> Trainer for ShellTrainer<S> {
    fn train(&self, session: &Session, split: &Split, model: &str) -> PipelineResult<ArtifactRef> {
        validate_model_name(model)?;
        let train_path = session.file(TRAIN_FILE);
        let test_path = session.file(TEST_FILE);
        write_tool_input(&train_path, split.train.records(), true)?;
        write_tool_input(&test_path, split.test.records(), true)?;

        let tool_dir = self.tool_dir.to_string_lossy();
        let train = train_path.to_string_lossy();
        let test = test_path.to_string_lossy();
        let command = self.template.render(&[
            ("tool_dir", tool_dir.as_ref()),
            ("train", train.as_ref()),
            ("test", test.as_ref()),
            ("model", model),
        ]);
        run(&command, session.path())?;

        let produced: Vec<PathBuf> = artifact_file_names(model)
            .iter()
            .map(|name| session.file(name))
            .collect();
        let missing: Vec<PathBuf> = produced.iter().filter(|p| !p.is_file()).cloned().collect();
        if !missing.is_empty() {
            return Err(PipelineError::ArtifactNotFound {
                model: model.to_owned(),
                missing,
            });
        }
        info!(model, "training finished");
        self.store.put(model, &produced)
    }
}

/// Classifier that shells out to a classification script.
#[derive(Debug, Clone)]
pub struct ShellClassifier {
    template: CommandTemplate,
    tool_dir: PathBuf,
}

impl ShellClassifier {
    #[must_use]
    pub fn new(template: CommandTemplate, tool_dir: impl Into<PathBuf>) -> Self {
        Self {
            template,
            tool_dir: tool_dir.into(),
        }
    }
}

impl Classifier for ShellClassifier {
    fn classify(
        &self,
        session: &Session,
        dataset: &Dataset,
        model: &ArtifactRef,
    ) -> PipelineResult<PredictionSet> {
        let input = session.file(TO_RUN_FILE);
        write_tool_input(&input, dataset.records(), dataset.is_labelled())?;

        let tool_dir = self.tool_dir.to_string_lossy();
        let model_path = model.model_path().map_or_else(
            || format!("{}.model", model.name),
            |p| p.to_string_lossy().into_owned(),
        );
        let input = input.to_string_lossy();
        let output = session.file(PREDICTIONS_FILE);
        let output = output.to_string_lossy();
        let command = self.template.render(&[
            ("tool_dir", tool_dir.as_ref()),
            ("input", input.as_ref()),
            ("model", model.name.as_str()),
            ("model_path", model_path.as_str()),
            ("output", output.as_ref()),
        ]);
        run(&command, session.path())?;

        let output = locate_output(session)?;
        read_predictions(&output)
    }
}

fn locate_output(session: &Session) -> PipelineResult<PathBuf> {
    let direct = session.file(PREDICTIONS_FILE);
    if direct.is_file() {
        return Ok(direct);
    }
    let nested = session.path().join(PREDICTIONS_DIR).join(PREDICTIONS_FILE);
    if nested.is_file() {
        warn!(path = %nested.display(), "reading predictions from nested folder");
        return Ok(nested);
    }
    Err(PipelineError::malformed(
        direct,
        "classifier reported success but wrote no output file",
    ))
}

/// Read a classifier output table.
///
/// Columns are matched exactly first and case-insensitively second.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedOutput`] when the file cannot be parsed
/// or lacks the `ID` or `PREDICTED` column.
pub fn read_predictions(path: &Path) -> PipelineResult<PredictionSet> {
    let table = read_table(path, Delimiter::Comma)
        .map_err(|e| PipelineError::malformed(path, e.to_string()))?;
    let find = |name: &str| {
        table
            .column(name)
            .or_else(|| table.headers().iter().position(|h| h.eq_ignore_ascii_case(name)))
            .ok_or_else(|| PipelineError::malformed(path, format!("missing column \"{name}\"")))
    };
    let id_idx = find(OUTPUT_ID_COLUMN)?;
    let predicted_idx = find(OUTPUT_PREDICTED_COLUMN)?;
    let predictions = table
        .rows()
        .iter()
        .map(|row| Prediction {
            id: row.get(id_idx).cloned().unwrap_or_default(),
            label: row.get(predicted_idx).cloned().unwrap_or_default(),
        })
        .collect();
    Ok(PredictionSet::new(path, predictions))
}
