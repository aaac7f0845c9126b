use std::process::ExitCode;

use clap::Parser;
use senti_runner::cli::{Mode, SentiArgs};
use senti_runner::config::Settings;
use senti_runner::error::{PipelineError, PipelineResult};
use senti_runner::logging;
use senti_runner::pipeline::ShellPipeline;
use tracing::error;

fn main() -> ExitCode {
    let args = SentiArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            eprintln!("Error: {err}");
            if let Some((stdout, stderr)) = err.captured_output() {
                eprintln!("--- captured stdout ---\n{stdout}");
                eprintln!("--- captured stderr ---\n{stderr}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &SentiArgs) -> PipelineResult<()> {
    let mut settings = Settings::load(args.config_path.as_deref())?;
    logging::init(&settings.log);
    settings.keep_work_dir |= args.keep_work_dir;
    let cwd = std::env::current_dir().map_err(|e| PipelineError::Io {
        path: ".".into(),
        source: e,
    })?;
    let settings = settings.resolve_paths(&cwd);
    let pipeline = ShellPipeline::from_settings(&settings);

    match args.mode()? {
        Mode::List => {
            pipeline.list()?;
        }
        Mode::Train(request) => {
            pipeline.train(&request)?;
        }
        Mode::Predict(request) => {
            pipeline.predict(&request)?;
        }
    }
    Ok(())
}
