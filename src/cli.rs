//! Command-line arguments for the `senti` binary.
//!
//! Exactly one of `--train`, `--predict` or `--list` selects the mode.
//! Runtime settings (model directory, toolchain commands, working root) are
//! layered from defaults, an optional TOML file given by `--config-path`,
//! and `SENTI_*` environment variables; see [`crate::config`].

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::dataset::{ColumnMapping, Delimiter, LABEL_COLUMN, TEXT_COLUMN};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{DEFAULT_TEST_SPLIT, InputSpec, OutputSpec, PredictRequest, TrainRequest};

/// Command-line arguments for the `senti` binary.
///
/// # Examples
///
/// ```
/// use clap::Parser;
/// use senti_runner::cli::{Mode, SentiArgs};
///
/// let args = SentiArgs::try_parse_from(["senti", "--list"]).expect("parse args");
/// assert!(matches!(args.mode().expect("mode"), Mode::List));
/// ```
#[derive(Debug, Parser)]
#[command(name = "senti", version, about = "Prepare sentiment datasets and drive an external toolchain")]
#[command(group(ArgGroup::new("mode").required(true).args(["train", "list", "predict"])))]
pub struct SentiArgs {
    /// Train a model and evaluate it on a held-out split.
    #[arg(long)]
    pub train: bool,

    /// List stored models.
    #[arg(long)]
    pub list: bool,

    /// Classify a dataset with a stored model.
    #[arg(long)]
    pub predict: bool,

    /// Name of the model to train or use.
    #[arg(long)]
    pub model_name: Option<String>,

    /// Input dataset.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Where to write the prediction report.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Column holding the text.
    #[arg(long, default_value = TEXT_COLUMN)]
    pub text_column: String,

    /// Column holding the label.
    #[arg(long, default_value = LABEL_COLUMN)]
    pub label_column: String,

    /// Fraction of records held out for evaluation.
    #[arg(long, default_value_t = DEFAULT_TEST_SPLIT)]
    pub test_split: f64,

    /// Field separator: `c` for comma, `sc` for semicolon.
    #[arg(long, default_value = "c")]
    pub sep: String,

    /// Seed for the train/test split.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write classification metrics as JSON.
    #[arg(long)]
    pub metrics_output: Option<PathBuf>,

    /// Optional path to a TOML configuration file.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Keep the per-run working directory.
    #[arg(long)]
    pub keep_work_dir: bool,
}

/// The operation selected on the command line.
#[derive(Debug, Clone)]
pub enum Mode {
    Train(TrainRequest),
    Predict(PredictRequest),
    List,
}

impl SentiArgs {
    /// Turn the parsed flags into a pipeline request.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownFormat`] for a bad `--sep` and
    /// [`PipelineError::InvalidArgument`] when train or predict lack
    /// `--model-name` or `--input`.
    pub fn mode(&self) -> PipelineResult<Mode> {
        if self.list {
            return Ok(Mode::List);
        }
        let input = InputSpec {
            path: self.required(self.input.as_ref(), "--input")?.clone(),
            delimiter: Delimiter::from_flag(&self.sep)?,
            columns: ColumnMapping {
                text: self.text_column.clone(),
                label: self.label_column.clone(),
            },
        };
        let model = self.required(self.model_name.as_ref(), "--model-name")?.clone();
        let output = OutputSpec {
            report: self.output.clone(),
            metrics: self.metrics_output.clone(),
        };
        if self.train {
            Ok(Mode::Train(TrainRequest {
                input,
                model,
                test_split: self.test_split,
                seed: self.seed,
                output,
            }))
        } else {
            Ok(Mode::Predict(PredictRequest {
                input,
                model,
                output,
            }))
        }
    }

    fn required<'a, T>(&self, value: Option<&'a T>, flag: &str) -> PipelineResult<&'a T> {
        let mode = if self.train { "--train" } else { "--predict" };
        value.ok_or_else(|| PipelineError::InvalidArgument(format!("{mode} requires {flag}")))
    }
}
