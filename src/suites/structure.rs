//! Rejections must still use the error envelope the frontend parses.

use crate::models::{EndpointSpec, HttpMethod, Shape};
use crate::run_log::RunLog;
use crate::suites::Context;

const ENDPOINTS: [(&str, &str); 4] = [
    ("Get Accounts", "/accounts"),
    ("Get Categories", "/categories"),
    ("Get Transactions", "/transactions"),
    ("Get Analytics", "/analytics"),
];

pub async fn run(ctx: &Context, log: &mut RunLog) {
    for (name, path) in ENDPOINTS {
        let spec = EndpointSpec::api(format!("Response Structure - {}", name), HttpMethod::Get, path)
            .expect(Shape::ErrorEnvelope)
            .statuses(&[401]);
        ctx.check(&spec, log).await;
    }
}
