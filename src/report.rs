//! Merging predictions with their source records and scoring them.
//!
//! Predictions are joined to source records by identifier. Every source
//! record must receive exactly one prediction; anything else means the
//! classifier output does not describe the input and is rejected as
//! malformed.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::dataset::{Dataset, write_table};
use crate::error::{PipelineError, PipelineResult};
use crate::providers::PredictionSet;

/// Output column holding the identifier.
pub const ID_HEADER: &str = "Id";
/// Output column holding the source text.
pub const TEXT_HEADER: &str = "Text";
/// Output column holding the predicted label.
pub const PREDICTION_HEADER: &str = "Prediction";
/// Output column holding the ground-truth label.
pub const GROUND_TRUTH_HEADER: &str = "GroundTruth";

/// A prediction joined with its source text and, when known, ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub text: String,
    pub prediction: String,
    pub ground_truth: Option<String>,
}

/// Join `predictions` to `source` by identifier.
///
/// Rows come back in source order.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedOutput`] when a prediction repeats or
/// names an unknown identifier, or a source record has no prediction.
pub fn merge(predictions: &PredictionSet, source: &Dataset) -> PipelineResult<Vec<ReportRow>> {
    let path = predictions.source();
    if predictions.is_empty() && !source.is_empty() {
        return Err(PipelineError::malformed(path, "classifier output has no rows"));
    }
    let mut by_id: HashMap<&str, &str> = HashMap::with_capacity(predictions.len());
    for p in predictions.predictions() {
        if by_id.insert(p.id.as_str(), p.label.as_str()).is_some() {
            return Err(PipelineError::malformed(
                path,
                format!("identifier \"{}\" predicted more than once", p.id),
            ));
        }
    }

    let mut rows = Vec::with_capacity(source.len());
    for record in source.records() {
        let prediction = by_id.remove(record.id.as_str()).ok_or_else(|| {
            PipelineError::malformed(path, format!("no prediction for identifier \"{}\"", record.id))
        })?;
        rows.push(ReportRow {
            id: record.id.clone(),
            text: record.text.clone(),
            prediction: prediction.to_owned(),
            ground_truth: record.label.clone(),
        });
    }

    if let Some(unknown) = by_id.keys().min() {
        return Err(PipelineError::malformed(
            path,
            format!("prediction for unknown identifier \"{unknown}\""),
        ));
    }
    Ok(rows)
}

/// Write report rows with the canonical column names.
///
/// `GroundTruth` is only written when every row has one.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] when the file cannot be written.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> PipelineResult<()> {
    let with_truth = !rows.is_empty() && rows.iter().all(|r| r.ground_truth.is_some());
    let mut headers = vec![ID_HEADER, TEXT_HEADER, PREDICTION_HEADER];
    if with_truth {
        headers.push(GROUND_TRUTH_HEADER);
    }
    let lines = rows.iter().map(|r| {
        let mut line = vec![r.id.as_str(), r.text.as_str(), r.prediction.as_str()];
        if let (true, Some(truth)) = (with_truth, r.ground_truth.as_deref()) {
            line.push(truth);
        }
        line
    });
    write_table(path, &headers, lines)?;
    info!(path = %path.display(), rows = rows.len(), "wrote output file");
    Ok(())
}

/// Precision, recall and F1 for one label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class and aggregate classification quality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// One entry per label seen in ground truth or predictions, sorted.
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
}

#[derive(Default)]
struct Counts {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
}

#[expect(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
#[expect(clippy::float_arithmetic, reason = "ratio of counts")]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[expect(clippy::float_arithmetic, reason = "harmonic mean")]
fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    let sum = precision + recall;
    if sum > 0.0 {
        2.0 * precision * recall / sum
    } else {
        0.0
    }
}

impl ClassificationReport {
    /// Score `rows`; `None` when any row lacks ground truth or there are no
    /// rows at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use senti_runner::report::{ClassificationReport, ReportRow};
    ///
    /// let row = |p: &str, t: &str| ReportRow {
    ///     id: String::new(),
    ///     text: String::new(),
    ///     prediction: p.into(),
    ///     ground_truth: Some(t.into()),
    /// };
    /// let report = ClassificationReport::from_rows(&[row("pos", "pos"), row("neg", "pos")])
    ///     .expect("ground truth present");
    /// assert_eq!(report.classes.len(), 2);
    /// assert!((report.accuracy - 0.5).abs() < 1e-9);
    /// ```
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "averaging per-class scores")]
    #[expect(clippy::cast_precision_loss, reason = "label counts are small")]
    pub fn from_rows(rows: &[ReportRow]) -> Option<Self> {
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| r.ground_truth.as_deref().map(|t| (t, r.prediction.as_str())))
            .collect::<Option<_>>()?;
        if pairs.is_empty() {
            return None;
        }

        let labels: BTreeSet<&str> = pairs.iter().flat_map(|(t, p)| [*t, *p]).collect();
        let mut counts: HashMap<&str, Counts> = HashMap::new();
        let mut correct = 0;
        for &(truth, predicted) in &pairs {
            if truth == predicted {
                correct += 1;
                counts.entry(truth).or_default().true_positive += 1;
            } else {
                counts.entry(truth).or_default().false_negative += 1;
                counts.entry(predicted).or_default().false_positive += 1;
            }
        }

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|label| {
                let c = counts.get(label);
                let tp = c.map_or(0, |c| c.true_positive);
                let fp = c.map_or(0, |c| c.false_positive);
                let fn_ = c.map_or(0, |c| c.false_negative);
                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                ClassMetrics {
                    label: label.to_owned(),
                    precision,
                    recall,
                    f1: harmonic_mean(precision, recall),
                    support: tp + fn_,
                }
            })
            .collect();

        let total = pairs.len();
        let n = classes.len() as f64;
        let macro_avg = Averages {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
            support: total,
        };
        let weighted = |f: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| f(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = Averages {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        Some(Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
        })
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] when the file cannot be written.
    pub fn write_json(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| PipelineError::io(path, std::io::Error::other(e)))
    }
}

const AVG_LABELS: [&str; 3] = ["accuracy", "macro avg", "weighted avg"];

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .chain(AVG_LABELS.iter().map(|l| l.len()))
            .max()
            .unwrap_or_default();
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}
