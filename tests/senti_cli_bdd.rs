//! Behaviour tests for the `senti` CLI.
//!
//! Each scenario runs the binary inside a fresh directory with the toolchain
//! replaced by `sh` one-liners through `SENTI_*` variables.

mod support;

use assert_cmd::Command;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::fs;
use std::process::Output;
use support::{FAILING_TRAIN, FAKE_CLASSIFY, FAKE_TRAIN, reviews_csv, write_file};
use tempfile::TempDir;

struct CliContext {
    dir: TempDir,
    train_command: RefCell<&'static str>,
    output: RefCell<Option<Output>>,
}

#[fixture]
fn cli_context() -> CliContext {
    CliContext {
        dir: TempDir::new().unwrap_or_else(|e| panic!("create temp dir: {e}")),
        train_command: RefCell::new(FAKE_TRAIN),
        output: RefCell::new(None),
    }
}

impl CliContext {
    fn stream(&self, pick: fn(&Output) -> &[u8]) -> String {
        let output = self.output.borrow();
        let output = output.as_ref().unwrap_or_else(|| panic!("missing output"));
        String::from_utf8_lossy(pick(output)).into_owned()
    }
}

#[given("a stored model named \"{name}\"")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn given_model(name: String, #[from(cli_context)] ctx: &CliContext) {
    let models = ctx.dir.path().join("models");
    fs::create_dir_all(&models).unwrap_or_else(|e| panic!("create models dir: {e}"));
    write_file(&models, &format!("{name}.model"), "weights");
    write_file(&models, &format!("{name}.model_le"), "encoder");
}

#[given("the review dataset")]
fn given_reviews(#[from(cli_context)] ctx: &CliContext) {
    write_file(ctx.dir.path(), "reviews.csv", &reviews_csv());
}

#[given("a failing trainer")]
fn given_failing_trainer(#[from(cli_context)] ctx: &CliContext) {
    *ctx.train_command.borrow_mut() = FAILING_TRAIN;
}

#[when("running with \"{args}\"")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn when_running(args: String, #[from(cli_context)] ctx: &CliContext) {
    let output = Command::cargo_bin("senti")
        .unwrap_or_else(|e| panic!("failed to locate senti binary: {e}"))
        .current_dir(ctx.dir.path())
        .env("SENTI_TRAIN_COMMAND", *ctx.train_command.borrow())
        .env("SENTI_CLASSIFY_COMMAND", FAKE_CLASSIFY)
        .env("SENTI_WORK_ROOT", ctx.dir.path().join("work"))
        .args(args.split_whitespace())
        .output()
        .unwrap_or_else(|e| panic!("failed to run senti: {e}"));
    *ctx.output.borrow_mut() = Some(output);
}

#[then("it exits successfully")]
fn then_success(#[from(cli_context)] ctx: &CliContext) {
    let status = ctx
        .output
        .borrow()
        .as_ref()
        .unwrap_or_else(|| panic!("missing output"))
        .status;
    assert!(status.success(), "stderr: {}", ctx.stream(|o| o.stderr.as_slice()));
}

#[then("it exits with an error")]
fn then_error(#[from(cli_context)] ctx: &CliContext) {
    let status = ctx
        .output
        .borrow()
        .as_ref()
        .unwrap_or_else(|| panic!("missing output"))
        .status;
    assert!(!status.success());
}

#[then("stdout contains \"{text}\"")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn then_stdout(text: String, #[from(cli_context)] ctx: &CliContext) {
    let stdout = ctx.stream(|o| o.stdout.as_slice());
    assert!(stdout.contains(&text), "stdout: {stdout}");
}

#[then("stderr contains \"{text}\"")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn then_stderr(text: String, #[from(cli_context)] ctx: &CliContext) {
    let stderr = ctx.stream(|o| o.stderr.as_slice());
    assert!(stderr.contains(&text), "stderr: {stderr}");
}

#[then("the file \"{name}\" exists")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn then_file_exists(name: String, #[from(cli_context)] ctx: &CliContext) {
    assert!(ctx.dir.path().join(&name).is_file(), "{name} missing");
}

#[then("the file \"{name}\" does not exist")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "BDD macro injects owned value"
)]
fn then_file_absent(name: String, #[from(cli_context)] ctx: &CliContext) {
    assert!(!ctx.dir.path().join(&name).exists(), "{name} present");
}

#[scenario(path = "tests/features/senti_cli.feature", index = 0)]
fn list_models(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/senti_cli.feature", index = 1)]
fn no_mode(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/senti_cli.feature", index = 2)]
fn conflicting_modes(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/senti_cli.feature", index = 3)]
fn train_succeeds(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/senti_cli.feature", index = 4)]
fn train_fails(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/senti_cli.feature", index = 5)]
fn unknown_separator(cli_context: CliContext) {
    let _ = cli_context;
}
