use serde_json::json;

use crate::models::{EndpointSpec, HttpMethod, Shape};
use crate::run_log::RunLog;
use crate::suites::Context;

/// An id no deployment will ever have.
pub const MISSING_ID: &str = "does-not-exist";

pub fn endpoints() -> Vec<EndpointSpec> {
    let missing = |name: &str, method: HttpMethod, collection: &str| {
        let path = format!("/{}/{}", collection, urlencoding::encode(MISSING_ID));
        let spec = EndpointSpec::api(format!("Error Handling - {}", name), method, path)
            .expect(Shape::ErrorEnvelope)
            .statuses(&[401, 404]);
        if method == HttpMethod::Put {
            spec.json_body(json!({ "test": "data" }))
        } else {
            spec
        }
    };

    vec![
        missing("Invalid Account Update", HttpMethod::Put, "accounts"),
        missing("Invalid Category Update", HttpMethod::Put, "categories"),
        missing("Invalid Transaction Update", HttpMethod::Put, "transactions"),
        missing("Invalid Account Delete", HttpMethod::Delete, "accounts"),
        EndpointSpec::api(
            "Error Handling - Invalid Endpoint",
            HttpMethod::Get,
            "/invalid-endpoint",
        )
        .expect(Shape::ErrorEnvelope),
    ]
}

pub async fn run(ctx: &Context, log: &mut RunLog) {
    for spec in endpoints() {
        ctx.check(&spec, log).await;
    }
}
