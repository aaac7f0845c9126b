//! Layered runtime settings.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `SENTI_`. Later layers win.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::shell::{CLASSIFY_PLACEHOLDERS, CommandTemplate, TRAIN_PLACEHOLDERS};

/// Prefix of environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "SENTI_";

/// Setting names accepted from the environment. Other `SENTI_*` variables
/// are ignored so unrelated exports do not break loading.
pub const ENV_KEYS: &[&str] = &[
    "models_dir",
    "work_root",
    "tool_dir",
    "train_command",
    "classify_command",
    "keep_work_dir",
    "log",
];

/// Default training command.
pub const DEFAULT_TRAIN_COMMAND: &str = "bash {tool_dir}/train.sh -i {train} -i {test} -m {model}";
/// Default classification command.
pub const DEFAULT_CLASSIFY_COMMAND: &str =
    "bash {tool_dir}/classification.sh -i {input} -m {model_path} -o {output}";

/// Errors raised while loading or validating [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime settings for the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory holding `<name>.model` / `<name>.model_le` pairs.
    pub models_dir: PathBuf,
    /// Parent of per-invocation working directories; the system temporary
    /// directory when unset.
    pub work_root: Option<PathBuf>,
    /// Directory containing the toolchain scripts, substituted for
    /// `{tool_dir}`.
    pub tool_dir: PathBuf,
    pub train_command: String,
    pub classify_command: String,
    /// Keep working directories after the run for inspection.
    pub keep_work_dir: bool,
    /// `tracing` filter directive, e.g. `info` or `senti_runner=debug`.
    pub log: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            work_root: None,
            tool_dir: PathBuf::from("."),
            train_command: DEFAULT_TRAIN_COMMAND.to_owned(),
            classify_command: DEFAULT_CLASSIFY_COMMAND.to_owned(),
            keep_work_dir: false,
            log: "info".to_owned(),
        }
    }
}

impl Settings {
    /// Assemble the provider stack without extracting it.
    #[must_use]
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file_exact(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).only(ENV_KEYS))
    }

    /// Load and validate settings from defaults, `config_path` and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer contains invalid values or the
    /// merged settings fail [`Settings::validate`].
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings: Self = Self::figment(config_path).extract().map_err(Box::new)?;
        settings.validate()
    }

    /// Ensure command templates only use known placeholders and reference
    /// the inputs they need.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        check_template(
            "train_command",
            &self.train_command,
            TRAIN_PLACEHOLDERS,
            &[&["train"], &["test"], &["model"]],
        )?;
        check_template(
            "classify_command",
            &self.classify_command,
            CLASSIFY_PLACEHOLDERS,
            &[&["input"], &["output"], &["model", "model_path"]],
        )?;
        if self.models_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("models_dir must not be empty".into()));
        }
        Ok(self)
    }

    /// Make every relative directory absolute with respect to `base`.
    #[must_use]
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let absolute = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.models_dir = absolute(self.models_dir);
        self.tool_dir = absolute(self.tool_dir);
        self.work_root = self.work_root.map(absolute);
        self
    }

    /// Directory that receives per-invocation working directories.
    #[must_use]
    pub fn work_root(&self) -> PathBuf {
        self.work_root.clone().unwrap_or_else(std::env::temp_dir)
    }

    #[must_use]
    pub fn train_template(&self) -> CommandTemplate {
        CommandTemplate::new(&self.train_command)
    }

    #[must_use]
    pub fn classify_template(&self) -> CommandTemplate {
        CommandTemplate::new(&self.classify_command)
    }
}

/// `required` lists groups of placeholders; at least one of each group must
/// appear.
fn check_template(
    field: &str,
    template: &str,
    allowed: &[&str],
    required: &[&[&str]],
) -> Result<(), ConfigError> {
    if template.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    let template = CommandTemplate::new(template);
    let used = template.placeholders();
    if let Some(unknown) = used.iter().find(|p| !allowed.contains(*p)) {
        return Err(ConfigError::Invalid(format!(
            "{field} uses unknown placeholder {{{unknown}}}"
        )));
    }
    if let Some(group) = required
        .iter()
        .find(|group| !group.iter().any(|p| used.contains(p)))
    {
        return Err(ConfigError::Invalid(format!(
            "{field} must reference {{{}}}",
            group.join("} or {")
        )));
    }
    Ok(())
}
