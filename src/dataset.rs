//! Dataset ingestion and normalisation.
//!
//! A delimited file is first read verbatim into a [`RawTable`]. Normalising
//! the table produces a [`Dataset`] whose records carry the canonical
//! `id`, `text` and `label` fields. Text is cleaned of newline characters and
//! otherwise left untouched: no trimming, deduplication or encoding
//! detection happens here.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Canonical identifier column.
pub const ID_COLUMN: &str = "id";
/// Canonical text column.
pub const TEXT_COLUMN: &str = "text";
/// Canonical label column.
pub const LABEL_COLUMN: &str = "label";

static NEWLINES: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "literal pattern cannot fail")]
    Regex::new(r"\r\n|[\r\n]").expect("valid regex")
});

/// Field separator style of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// `,` selected with the `c` flag.
    #[default]
    Comma,
    /// `;` selected with the `sc` flag.
    Semicolon,
}

impl Delimiter {
    /// Resolve a command-line delimiter flag.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownFormat`] for anything other than `c`
    /// or `sc`.
    ///
    /// # Examples
    ///
    /// ```
    /// use senti_runner::dataset::Delimiter;
    ///
    /// assert_eq!(Delimiter::from_flag("sc").ok(), Some(Delimiter::Semicolon));
    /// assert!(Delimiter::from_flag("tab").is_err());
    /// ```
    pub fn from_flag(flag: &str) -> PipelineResult<Self> {
        match flag {
            "c" => Ok(Self::Comma),
            "sc" => Ok(Self::Semicolon),
            other => Err(PipelineError::UnknownFormat {
                flag: other.to_owned(),
            }),
        }
    }

    /// Byte used by the CSV reader and writer.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
        }
    }
}

impl FromStr for Delimiter {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_flag(s)
    }
}

/// Rows exactly as read from a delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from in-memory headers and rows.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    /// Where the table was read from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of the column with exactly this name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of the identifier column, matched case-insensitively.
    #[must_use]
    pub fn id_column(&self) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(ID_COLUMN))
    }
}

/// One normalised row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub text: String,
    pub label: Option<String>,
}

/// Ordered, normalised records sharing the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Wrap records that already satisfy the normalisation invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidArgument`] when identifiers repeat or
    /// a text field still contains a newline.
    pub fn from_records(records: Vec<Record>) -> PipelineResult<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(PipelineError::InvalidArgument(format!(
                    "duplicate identifier \"{}\"",
                    record.id
                )));
            }
            if NEWLINES.is_match(&record.text) {
                return Err(PipelineError::InvalidArgument(format!(
                    "text of record \"{}\" contains a newline",
                    record.id
                )));
            }
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether every record carries a ground-truth label.
    #[must_use]
    pub fn is_labelled(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(|r| r.label.is_some())
    }

    /// Render the dataset back into a table with canonical columns.
    ///
    /// The label column is only emitted when every record is labelled.
    #[must_use]
    pub fn to_table(&self) -> RawTable {
        let labelled = self.is_labelled();
        let mut headers = vec![ID_COLUMN.to_owned(), TEXT_COLUMN.to_owned()];
        if labelled {
            headers.push(LABEL_COLUMN.to_owned());
        }
        let rows = self
            .records
            .iter()
            .map(|r| {
                let mut row = vec![r.id.clone(), r.text.clone()];
                if let (true, Some(label)) = (labelled, &r.label) {
                    row.push(label.clone());
                }
                row
            })
            .collect();
        RawTable::new("<normalised>", headers, rows)
    }
}

impl From<Dataset> for Vec<Record> {
    fn from(value: Dataset) -> Self {
        value.records
    }
}

/// Whether a label column must exist in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Training and evaluation: the label column is mandatory.
    Required,
    /// Prediction: ground truth is used when the column happens to exist.
    Optional,
}

/// Names of the source columns that map onto the canonical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub text: String,
    pub label: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            text: TEXT_COLUMN.to_owned(),
            label: LABEL_COLUMN.to_owned(),
        }
    }
}

/// Replace every newline sequence with a single space.
///
/// `\r\n` counts as one newline. The function is idempotent.
///
/// # Examples
///
/// ```
/// use senti_runner::dataset::clean_text;
///
/// assert_eq!(clean_text("great\nproduct\r\n!"), "great product !");
/// ```
#[must_use]
pub fn clean_text(text: &str) -> String {
    NEWLINES.replace_all(text, " ").into_owned()
}

/// Read a delimited file with a header row.
///
/// Quoted fields may span several lines.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] when `path` is not an existing
/// regular file or the content is not a well-formed table.
pub fn read_table(path: &Path, delimiter: Delimiter) -> PipelineResult<RawTable> {
    let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Err(PipelineError::invalid_input(path, "not an existing regular file"));
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_path(path)
        .map_err(|e| PipelineError::invalid_input(path, e.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|e| PipelineError::invalid_input(path, e.to_string()))?
        .iter()
        .map(str::to_owned)
        .collect();
    let rows = reader
        .records()
        .map(|row| {
            row.map(|r| r.iter().map(str::to_owned).collect())
                .map_err(|e| PipelineError::invalid_input(path, e.to_string()))
        })
        .collect::<PipelineResult<Vec<Vec<String>>>>()?;
    debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(RawTable::new(path, headers, rows))
}

/// Write `headers` and `rows` as a comma-delimited file, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be created or written.
pub fn write_table<R, F>(path: &Path, headers: &[&str], rows: R) -> PipelineResult<()>
where
    R: IntoIterator<Item = Vec<F>>,
    F: AsRef<[u8]>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let to_io = |e: csv::Error| PipelineError::io(path, std::io::Error::other(e));
    let mut writer = csv::Writer::from_path(path).map_err(to_io)?;
    writer.write_record(headers).map_err(to_io)?;
    for row in rows {
        writer.write_record(row).map_err(to_io)?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

/// Map a raw table onto the canonical schema.
///
/// An `id` column (any letter case) is reused when present, otherwise the
/// zero-based row position becomes the identifier.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] when the text column is missing,
/// the label column is missing in [`LabelMode::Required`], or identifiers
/// repeat.
pub fn normalize(
    table: &RawTable,
    mapping: &ColumnMapping,
    mode: LabelMode,
) -> PipelineResult<Dataset> {
    let missing = |name: &str| {
        PipelineError::invalid_input(table.source(), format!("column \"{name}\" not found"))
    };
    let text_idx = table.column(&mapping.text).ok_or_else(|| missing(&mapping.text))?;
    let label_idx = match (table.column(&mapping.label), mode) {
        (Some(idx), _) => Some(idx),
        (None, LabelMode::Optional) => None,
        (None, LabelMode::Required) => return Err(missing(&mapping.label)),
    };
    let id_idx = table.id_column();

    let field = |row: &[String], idx: usize| row.get(idx).cloned().unwrap_or_default();
    let records = table
        .rows()
        .iter()
        .enumerate()
        .map(|(pos, row)| Record {
            id: id_idx.map_or_else(|| pos.to_string(), |idx| field(row, idx)),
            text: clean_text(&field(row, text_idx)),
            label: label_idx.map(|idx| field(row, idx)),
        })
        .collect();
    Dataset::from_records(records)
        .map_err(|e| PipelineError::invalid_input(table.source(), e.to_string()))
}

/// Read and normalise a dataset file in one step.
///
/// # Errors
///
/// Propagates the errors of [`read_table`] and [`normalize`].
pub fn load(
    path: &Path,
    delimiter: Delimiter,
    mapping: &ColumnMapping,
    mode: LabelMode,
) -> PipelineResult<Dataset> {
    let table = read_table(path, delimiter)?;
    normalize(&table, mapping, mode)
}
