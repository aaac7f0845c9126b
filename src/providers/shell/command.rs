//! Command templates and blocking subprocess execution.
//!
//! Templates are shell command lines containing `{name}` placeholders.
//! Substituted values are single-quoted so paths with spaces or shell
//! metacharacters reach the tool intact. Commands run through `sh -c` and
//! block until the child exits; no timeout is applied.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::expect_used, reason = "literal pattern cannot fail")]
    Regex::new(r"\{([a-z_]+)\}").expect("valid regex")
});

/// A command line with named placeholders.
///
/// # Examples
///
/// ```
/// use senti_runner::providers::shell::CommandTemplate;
///
/// let t = CommandTemplate::new("bash train.sh -m {model}");
/// assert_eq!(t.render(&[("model", "it's")]), r"bash train.sh -m 'it'\''s'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate(String);

impl CommandTemplate {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names of the placeholders used by the template.
    #[must_use]
    pub fn placeholders(&self) -> BTreeSet<&str> {
        PLACEHOLDER
            .captures_iter(&self.0)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Substitute quoted `values`; unknown placeholders are left as written.
    #[must_use]
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        PLACEHOLDER
            .replace_all(&self.0, |caps: &Captures<'_>| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map_or_else(
                        || caps.get(0).map_or("", |m| m.as_str()).to_owned(),
                        |(_, value)| shell_quote(value),
                    )
            })
            .into_owned()
    }
}

/// Quote `value` for POSIX `sh`.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` with `sh -c` inside `dir`, waiting for it to exit.
///
/// Output is captured; on success it is echoed to the console so the user
/// sees the tool's diagnostics.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the shell cannot be spawned and
/// [`PipelineError::ExternalTool`] if the command exits unsuccessfully.
pub fn run(command: &str, dir: &Path) -> PipelineResult<CommandOutput> {
    info!(%command, dir = %dir.display(), "executing external command");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
        .map_err(|e| PipelineError::io(dir, e))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(PipelineError::ExternalTool {
            command: command.to_owned(),
            code: output.status.code(),
            stdout,
            stderr,
        });
    }
    info!(%command, "external command finished");
    print!("{stdout}");
    eprint!("{stderr}");
    Ok(CommandOutput { stdout, stderr })
}
