//! ovh-reconciler - updates a DNS zone stored in OVH from a simple text file
//!
//! Exit codes: 0 when the zone converged, 1 when some create/delete/refresh
//! failed, 2 when nothing was attempted (config, parse or fetch error).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ovh_reconciler::config::{Config, Overrides};
use ovh_reconciler::constants::EXIT_ABORTED;
use ovh_reconciler::ovh::OvhClient;
use ovh_reconciler::reconciler::{read_input, redact_secrets, Reconciler, RunSummary};

//==============================================================================
// Main
//==============================================================================

#[derive(Debug, Parser)]
#[command(name = "ovh-reconciler")]
#[command(version)]
#[command(about = "Updates a DNS zone stored in OVH from a simple text file")]
struct Args {
    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::load(args.config, &args.overrides).context("Config load failed") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EXIT_ABORTED);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&config).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::from(summary.exit_code())
        }
        Err(e) => {
            let message = redact_secrets(
                &format!("{e:#}"),
                &[config.application_secret.as_str(), config.consumer_key.as_str()],
            );
            error!("Reconciliation aborted, zone left untouched: {}", message);
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let client = OvhClient::new(
        config.endpoint.base_url(),
        config.credentials(),
        config.timeout,
    )
    .context("OVH client failed")?;

    let input = read_input(&config.input).await?;
    let reconciler = Reconciler::new(&config.dns_zone, Arc::new(client)).with_secrets(&[
        config.application_secret.as_str(),
        config.consumer_key.as_str(),
    ]);
    Ok(reconciler.run(&input, config.dry_run).await?)
}

fn print_summary(summary: &RunSummary) {
    match &summary.report {
        Some(report) => {
            info!(
                "Done: {} in {} ms",
                report,
                report.duration().num_milliseconds()
            );
            for (operation, error) in report.failures() {
                error!("Failed to {} {}", operation.verb(), error);
            }
        }
        None if summary.plan.is_empty() => info!("Done: no changes"),
        None => info!("Done: {} changes planned, none applied", summary.plan.len()),
    }
    if let Some(e) = &summary.refresh_error {
        error!("Changes applied but zone refresh failed: {}", e);
    }
}
