use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use promptcast::app::{self, RunInputs};
use promptcast::cli::Cli;
use promptcast::config::Config;
use promptcast::dispatch::registry::ProviderRegistry;
use promptcast::error::PromptcastError;
use promptcast::output::{self, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v. Logs go to stderr; stdout carries the report.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        tracing::warn!("failed to load .env: {e}");
    }

    let (Some(models), Some(prompt)) = (cli.model_source(), cli.prompt_source()) else {
        // clap enforces both groups; only reachable if that config changes.
        anyhow::bail!("both a model source and a prompt source are required");
    };

    let inputs = RunInputs {
        models,
        prompt,
        system_prompt: cli.system_prompt_source(),
        output_dir: cli.output_dir.clone(),
    };

    let config = Config::load(cli.config.as_deref()).await?;
    let registry = ProviderRegistry::from_config(config)?;

    match app::run(&registry, &inputs, &SystemClock).await {
        Ok(outcome) => {
            print!("{}", output::render_report(&outcome.results, &outcome.results_file));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_failure(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_failure(e: &PromptcastError) {
    tracing::debug!("run aborted: {e:?}");
    if e.is_input_error() {
        println!("{}", e.user_message());
    } else {
        eprintln!("error: {}", e.user_message());
        if let Some(provider) = e.provider() {
            tracing::warn!(provider, "details: {e}");
        }
    }
}
