use serde_json::json;

use crate::models::{EndpointSpec, HttpMethod};
use crate::run_log::RunLog;
use crate::services::classifier::classify;
use crate::suites::Context;

const CORS_HEADERS: [&str; 3] = [
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
];

/// The preflight only has to be answered; 404 means OPTIONS is not routed, which is tolerated.
pub async fn run(ctx: &Context, log: &mut RunLog) {
    let spec = EndpointSpec::api("CORS - Preflight", HttpMethod::Options, "/accounts")
        .statuses(&[200, 204, 404]);

    match ctx.executor.send(&spec).await {
        Ok(response) => {
            let headers: serde_json::Map<String, serde_json::Value> = CORS_HEADERS
                .iter()
                .map(|name| (name.to_string(), json!(response.header(name))))
                .collect();
            let verdict = classify(&spec, &response, ctx.config.auth_policy)
                .with_details(json!({ "status": response.status, "headers": headers }));
            log.record(&spec.name, verdict);
        }
        Err(e) => ctx.record_transport_failure(&spec.name, &e, log),
    }
}
