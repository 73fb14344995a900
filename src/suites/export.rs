//! Export downloads and the integrity of what they contain.

use tracing::{info, warn};

use crate::models::{EndpointSpec, ExportFormat, HttpMethod, Shape, Verdict};
use crate::run_log::RunLog;
use crate::services::export_validator::{self, ExportArtifact};
use crate::services::executor::RawResponse;
use crate::suites::Context;

/// Large enough to list every transaction of a seeded fixture.
pub const LISTING_PATH: &str = "/transactions?limit=1000";

fn export_path(format: ExportFormat) -> String {
    format!("/export?format={}", format.extension())
}

/// Requests go out as the configured user when there is one.
fn export_spec(ctx: &Context, format: ExportFormat) -> EndpointSpec {
    let spec = EndpointSpec::api(
        format!("Export - {} Response", format.label()),
        HttpMethod::Get,
        export_path(format),
    )
    .expect(Shape::Export(format));
    if ctx.executor.has_credentials() {
        spec.authenticated()
    } else {
        spec
    }
}

/// Download one format and record its response and structure checks.
async fn download(
    ctx: &Context,
    format: ExportFormat,
    log: &mut RunLog,
) -> (Option<RawResponse>, Option<ExportArtifact>) {
    let spec = export_spec(ctx, format);
    let Some(response) = ctx.check(&spec, log).await else {
        return (None, None);
    };
    if response.status != 200 {
        return (Some(response), None);
    }

    let parsed = export_validator::parse(format, &response.body);
    log.record(
        format!("Export - {} Structure", format.label()),
        export_validator::check_structure(format, &parsed),
    );
    (Some(response), parsed.ok())
}

pub async fn run(ctx: &Context, log: &mut RunLog) {
    if !ctx.executor.has_credentials() {
        info!("No credentials configured, export checks run unauthenticated");
    }
    let authenticated = ctx.executor.has_credentials();

    let (csv_response, csv) = download(ctx, ExportFormat::Csv, log).await;
    let (_, xlsx) = download(ctx, ExportFormat::Xlsx, log).await;

    check_default_format(ctx, csv_response.as_ref(), authenticated, log).await;

    let artifacts: Vec<&ExportArtifact> = csv.iter().chain(xlsx.iter()).collect();
    if artifacts.is_empty() {
        warn!("No export could be decoded, skipping data integrity checks");
        return;
    }

    if let Some(listed) = listed_transactions(ctx, authenticated, log).await {
        for artifact in &artifacts {
            log.record(
                format!("Data Integrity - {} Rows vs Listing", artifact.format.label()),
                export_validator::check_row_count(artifact.format, artifact.row_count, listed),
            );
        }
    }

    for artifact in &artifacts {
        log.record(
            format!("Data Integrity - {} Required Fields", artifact.format.label()),
            export_validator::check_required_values(artifact),
        );
    }
}

async fn check_default_format(
    ctx: &Context,
    explicit_csv: Option<&RawResponse>,
    authenticated: bool,
    log: &mut RunLog,
) {
    const NAME: &str = "Export - Default Format";

    let default = match ctx.executor.get_api("/export", authenticated).await {
        Ok(response) => response,
        Err(e) => return ctx.record_transport_failure(NAME, &e, log),
    };

    let verdict = match explicit_csv {
        Some(csv) => export_validator::check_default_format(&default, csv),
        None => Verdict::fail("Explicit CSV export unavailable for comparison"),
    };
    log.record(NAME, verdict);
}

/// How many transactions the listing endpoint reports, recording a failure when it cannot say.
async fn listed_transactions(ctx: &Context, authenticated: bool, log: &mut RunLog) -> Option<usize> {
    const NAME: &str = "Data Integrity - Transactions Listing";

    let response = match ctx.executor.get_api(LISTING_PATH, authenticated).await {
        Ok(response) => response,
        Err(e) => {
            ctx.record_transport_failure(NAME, &e, log);
            return None;
        }
    };

    if response.status != 200 {
        log.record(
            NAME,
            Verdict::fail(format!("HTTP {}: {}", response.status, response.excerpt())),
        );
        return None;
    }

    match export_validator::count_listed_transactions(&response.body) {
        Ok(count) => Some(count),
        Err(message) => {
            log.record(NAME, Verdict::fail(message));
            None
        }
    }
}
