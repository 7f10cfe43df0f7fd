mod bootstrap;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use qstats_core::settings::Settings;
use qstats_runtime::pipeline::{AnalysisPipeline, RunOutcome};

fn main() -> ExitCode {
    let settings = Settings::parse();

    if let Err(e) = bootstrap::setup_logging(
        settings.effective_log_level(),
        settings.log_file.as_deref(),
    ) {
        eprintln!("Failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    tracing::info!("qstats v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&settings) {
        Ok(RunOutcome::Completed(report)) => {
            tracing::info!("{} artifact(s) written", report.total());
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Aborted(reason)) => {
            tracing::error!("Run aborted: {}", reason);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("Unexpected error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<RunOutcome> {
    let config = settings
        .to_config()
        .context("invalid command-line configuration")?;
    tracing::debug!("Resolved configuration: {:?}", config);
    Ok(AnalysisPipeline::new(config).run())
}
