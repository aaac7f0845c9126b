//! Tests for reading and normalising input datasets from disk.

mod support;

use proptest::prelude::*;
use rstest::{fixture, rstest};
use senti_runner::dataset::{clean_text, load, read_table, write_table};
use senti_runner::{ColumnMapping, Delimiter, LabelMode, PipelineError};
use support::{reviews_csv, write_file};
use tempfile::TempDir;

#[fixture]
fn dir() -> TempDir {
    TempDir::new().unwrap_or_else(|e| panic!("create temp dir: {e}"))
}

fn review_columns() -> ColumnMapping {
    ColumnMapping {
        text: "review".into(),
        label: "sentiment".into(),
    }
}

#[rstest]
fn positions_become_identifiers_without_id_column(dir: TempDir) {
    let path = write_file(dir.path(), "reviews.csv", &reviews_csv());
    let data = load(&path, Delimiter::Comma, &review_columns(), LabelMode::Required)
        .unwrap_or_else(|e| panic!("load failed: {e}"));
    assert_eq!(data.len(), 10);
    let ids: Vec<&str> = data.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
    assert_eq!(data.records()[1].label.as_deref(), Some("negative"));
}

#[rstest]
#[case("id")]
#[case("ID")]
#[case("Id")]
fn existing_id_column_is_reused_in_any_case(dir: TempDir, #[case] header: &str) {
    let content = format!("{header};text;label\na7;first;pos\nb9;second;neg\n");
    let path = write_file(dir.path(), "semi.csv", &content);
    let data = load(&path, Delimiter::Semicolon, &ColumnMapping::default(), LabelMode::Required)
        .unwrap_or_else(|e| panic!("load failed: {e}"));
    let ids: Vec<&str> = data.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a7", "b9"]);
}

#[rstest]
fn quoted_multiline_text_is_flattened(dir: TempDir) {
    let content = "text,label\n\"great\nproduct\r\nreally\",pos\n\"plain\",neg\n";
    let path = write_file(dir.path(), "multi.csv", content);
    let data = load(&path, Delimiter::Comma, &ColumnMapping::default(), LabelMode::Required)
        .unwrap_or_else(|e| panic!("load failed: {e}"));
    assert_eq!(data.len(), 2);
    assert_eq!(data.records()[0].text, "great product really");
}

#[rstest]
fn missing_label_is_allowed_when_optional(dir: TempDir) {
    let path = write_file(dir.path(), "unlabelled.csv", "text\nhello\nworld\n");
    let data = load(&path, Delimiter::Comma, &ColumnMapping::default(), LabelMode::Optional)
        .unwrap_or_else(|e| panic!("load failed: {e}"));
    assert!(!data.is_labelled());
    assert!(matches!(
        load(&path, Delimiter::Comma, &ColumnMapping::default(), LabelMode::Required),
        Err(PipelineError::InvalidInput { .. })
    ));
}

#[rstest]
fn missing_text_column_is_invalid_input(dir: TempDir) {
    let path = write_file(dir.path(), "reviews.csv", &reviews_csv());
    let err = load(&path, Delimiter::Comma, &ColumnMapping::default(), LabelMode::Optional)
        .err()
        .unwrap_or_else(|| panic!("expected missing column error"));
    assert!(matches!(err, PipelineError::InvalidInput { .. }));
    assert!(err.to_string().contains("\"text\""), "{err}");
}

#[rstest]
fn directories_and_missing_paths_are_rejected(dir: TempDir) {
    assert!(matches!(
        read_table(dir.path(), Delimiter::Comma),
        Err(PipelineError::InvalidInput { .. })
    ));
    assert!(matches!(
        read_table(&dir.path().join("absent.csv"), Delimiter::Comma),
        Err(PipelineError::InvalidInput { .. })
    ));
}

#[rstest]
fn duplicate_identifiers_are_rejected(dir: TempDir) {
    let path = write_file(dir.path(), "dupes.csv", "id,text,label\n1,a,x\n1,b,y\n");
    assert!(matches!(
        load(&path, Delimiter::Comma, &ColumnMapping::default(), LabelMode::Required),
        Err(PipelineError::InvalidInput { .. })
    ));
}

#[rstest]
fn written_tables_read_back_with_quoting(dir: TempDir) {
    let path = dir.path().join("nested").join("out.csv");
    write_table(&path, &["id", "text"], [vec!["1", "a, b"], vec!["2", "say \"hi\""]])
        .unwrap_or_else(|e| panic!("write failed: {e}"));
    let table = read_table(&path, Delimiter::Comma).unwrap_or_else(|e| panic!("read failed: {e}"));
    assert_eq!(table.headers(), ["id", "text"]);
    assert_eq!(table.rows()[0][1], "a, b");
    assert_eq!(table.rows()[1][1], "say \"hi\"");
}

proptest! {
    #[test]
    fn cleaned_text_has_no_newlines(text in "[a-z \r\n]{0,40}") {
        let cleaned = clean_text(&text);
        prop_assert!(!cleaned.contains('\n') && !cleaned.contains('\r'));
        prop_assert_eq!(clean_text(&cleaned), cleaned.clone());
    }

    #[test]
    fn text_without_newlines_is_unchanged(text in "[a-zA-Z0-9 ,.!?]{0,40}") {
        prop_assert_eq!(clean_text(&text), text);
    }
}
