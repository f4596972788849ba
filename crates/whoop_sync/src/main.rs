use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use whoop_client::retry::RetryPolicy;
use whoop_client::{FileCredentialStore, OAuthClient, PageFetcher, TokenManager};
use whoop_sync::{Args, StdinPrompt, logging, run_sync, settings, telemetry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("whoop-sync: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let mut config = settings::load_config(&args.env_file).context("invalid configuration")?;
    args.apply(&mut config);
    let metrics = match &args.metrics_file {
        Some(_) => Some(telemetry::install().context("could not install metrics recorder")?),
        None => None,
    };

    let tokens = TokenManager::new(
        OAuthClient::new(&config),
        FileCredentialStore::new(&config.token_file),
        Box::new(StdinPrompt::stdin()),
    );
    let mut fetcher = PageFetcher::new(&config.api_base_url);
    if args.retries > 0 {
        fetcher = fetcher.with_retry(RetryPolicy {
            max_retries: args.retries,
            ..RetryPolicy::default()
        });
    }

    let resources = args.selected_resources();
    let summary = run_sync(
        &tokens,
        &fetcher,
        &resources,
        &config.output_dir,
        config.line_format,
    )
    .await
    .context("could not obtain an access token")?;

    for failure in summary.failures() {
        tracing::warn!(resource = %failure.resource, "re-run to complete this export");
    }
    tracing::info!(
        resources = summary.outcomes.len(),
        records = summary.records(),
        ok = summary.is_success(),
        "whoop-sync finished"
    );
    if let (Some(handle), Some(path)) = (&metrics, &args.metrics_file) {
        telemetry::write_snapshot(handle, path)
            .with_context(|| format!("could not write metrics to {}", path.display()))?;
    }
    Ok(summary.is_success())
}
