#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::fs;
use std::path::{Path, PathBuf};

/// Trainer command that writes both artefacts after checking its inputs.
pub const FAKE_TRAIN: &str = "test -s {train} && test -s {test} && printf weights > {model}.model && printf encoder > {model}.model_le";

/// Trainer command that fails without producing anything.
pub const FAILING_TRAIN: &str = "echo 'training exploded' >&2; exit 1 # {train} {test} {model}";

/// Trainer command that succeeds but only writes the model file.
pub const PARTIAL_TRAIN: &str = "printf weights > {model}.model # {train} {test}";

/// Classifier command that predicts `positive` for every row and fails when
/// the model file is absent.
pub const FAKE_CLASSIFY: &str = r#"test -f {model_path} && awk -F, 'NR==1{print "ID,PREDICTED"; next} {print $1",positive"}' {input} > {output}"#;

#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
#[must_use]
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

/// Ten labelled reviews with `review`/`sentiment` columns and no `id`.
#[must_use]
pub fn reviews_csv() -> String {
    let mut out = String::from("review,sentiment\n");
    for i in 0..10 {
        let label = if i % 2 == 0 { "positive" } else { "negative" };
        out.push_str(&format!("review number {i},{label}\n"));
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

#[must_use]
pub fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}
