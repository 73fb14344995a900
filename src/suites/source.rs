use tracing::info;

use crate::models::Verdict;
use crate::run_log::RunLog;
use crate::services::source_checks::{analyze, default_checks};
use crate::suites::Context;

pub async fn run(ctx: &Context, log: &mut RunLog) {
    let Some(path) = &ctx.config.source_path else {
        info!("No export source configured, skipping code analysis");
        return;
    };

    match tokio::fs::read_to_string(path).await {
        Ok(source) => {
            for (name, verdict) in analyze(&source, &default_checks()) {
                log.record(name, verdict);
            }
        }
        Err(e) => {
            log.record(
                "Code Analysis - File Access",
                Verdict::fail(format!("Cannot read {}: {}", path.display(), e)).critical(true),
            );
        }
    }
}
