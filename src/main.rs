use std::io::Write;

use finprobe::config::Config;
use finprobe::services::fixtures::{self, FixtureCommands};
use finprobe::services::report;
use finprobe::services::summary::{ExitStatus, RunSummary};
use finprobe::suites::{self, Context};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finprobe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    std::process::exit(run().await.code());
}

async fn run() -> ExitStatus {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitStatus::Critical;
        }
    };
    tracing::info!(
        version = finprobe::VERSION,
        base_url = %config.base_url,
        suites = config.suites.len(),
        "Starting API conformance run"
    );

    if let Some(app_dir) = &config.app_dir {
        if let Err(e) = fixtures::provision(app_dir, config.seed, &FixtureCommands::default()).await {
            tracing::error!("Fixture provisioning failed: {}", e);
            return ExitStatus::Critical;
        }
    }

    let report_json = config.report_json.clone();
    let ctx = match Context::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitStatus::Critical;
        }
    };

    let log = suites::run_all(&ctx).await;
    let summary = RunSummary::from_results(log.results());

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = report::render(&mut stdout, log.results(), &summary) {
        tracing::error!("Failed to write report: {}", e);
    }
    if let Err(e) = stdout.flush() {
        tracing::error!("Failed to flush report: {}", e);
    }

    if let Some(path) = report_json {
        match report::write_json(&path, log.results(), &summary) {
            Ok(()) => tracing::info!(path = %path.display(), "Wrote JSON report"),
            Err(e) => tracing::error!("Failed to write JSON report: {}", e),
        }
    }

    let critical = log.critical_issues().count();
    if critical > 0 {
        tracing::error!(critical, "Run finished with critical issues");
    }

    summary.exit_status()
}
