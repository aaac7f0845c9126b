//! Unit tests for `SentiArgs` parsing and mode selection.

use clap::Parser;
use rstest::rstest;
use senti_runner::cli::{Mode, SentiArgs};
use senti_runner::{Delimiter, PipelineError};
use std::path::Path;

fn parse(argv: &[&str]) -> SentiArgs {
    SentiArgs::try_parse_from(argv).unwrap_or_else(|e| panic!("unexpected parse error: {e}"))
}

#[rstest]
#[case(vec!["senti"])]
#[case(vec!["senti", "--train", "--list"])]
#[case(vec!["senti", "--predict", "--train"])]
#[case(vec!["senti", "--list", "--predict"])]
#[case(vec!["senti", "--list", "--test-split", "half"])]
fn rejects_missing_or_conflicting_modes(#[case] argv: Vec<&str>) {
    assert!(SentiArgs::try_parse_from(argv).is_err());
}

#[rstest]
fn list_needs_nothing_else() {
    assert!(matches!(parse(&["senti", "--list"]).mode(), Ok(Mode::List)));
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
fn train_collects_every_option() {
    let args = parse(&[
        "senti",
        "--train",
        "--model-name",
        "imdb",
        "--input",
        "data/reviews.csv",
        "--output",
        "out.csv",
        "--text-column",
        "review",
        "--label-column",
        "sentiment",
        "--test-split",
        "0.25",
        "--sep",
        "sc",
        "--seed",
        "42",
        "--metrics-output",
        "metrics.json",
    ]);
    let Ok(Mode::Train(request)) = args.mode() else {
        panic!("expected train mode");
    };
    assert_eq!(request.model, "imdb");
    assert_eq!(request.input.path, Path::new("data/reviews.csv"));
    assert_eq!(request.input.delimiter, Delimiter::Semicolon);
    assert_eq!(request.input.columns.text, "review");
    assert_eq!(request.input.columns.label, "sentiment");
    assert_eq!(request.seed, Some(42));
    assert_eq!(request.output.report.as_deref(), Some(Path::new("out.csv")));
    assert_eq!(request.output.metrics.as_deref(), Some(Path::new("metrics.json")));
    assert!((request.test_split - 0.25).abs() < f64::EPSILON);
}

#[rstest]
fn predict_uses_default_columns_and_separator() {
    let args = parse(&["senti", "--predict", "--model-name", "m", "--input", "x.csv"]);
    let Ok(Mode::Predict(request)) = args.mode() else {
        panic!("expected predict mode");
    };
    assert_eq!(request.input.delimiter, Delimiter::Comma);
    assert_eq!(request.input.columns.text, "text");
    assert_eq!(request.input.columns.label, "label");
    assert!(request.output.report.is_none());
}

#[rstest]
#[case(&["senti", "--train", "--input", "x.csv"], "--model-name")]
#[case(&["senti", "--predict", "--model-name", "m"], "--input")]
fn missing_required_flag_is_invalid_argument(#[case] argv: &[&str], #[case] flag: &str) {
    match parse(argv).mode() {
        Err(PipelineError::InvalidArgument(msg)) => assert!(msg.contains(flag), "{msg}"),
        other => panic!("expected invalid argument, got {other:?}"),
    }
}

#[rstest]
#[case("tab")]
#[case("C")]
#[case(";")]
fn unknown_separator_is_rejected(#[case] sep: &str) {
    let args = parse(&["senti", "--predict", "--model-name", "m", "--input", "x.csv", "--sep", sep]);
    assert!(matches!(args.mode(), Err(PipelineError::UnknownFormat { .. })));
}
