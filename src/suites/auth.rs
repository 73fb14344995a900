//! Every protected endpoint must refuse unauthenticated callers.

use serde_json::json;

use crate::models::{EndpointSpec, HttpMethod, Shape};
use crate::run_log::RunLog;
use crate::suites::Context;

pub fn endpoints() -> Vec<EndpointSpec> {
    let protected = |name: &str, method: HttpMethod, path: &str| {
        EndpointSpec::api(format!("Auth Security - {}", name), method, path)
            .expect(Shape::Unauthorized)
            .critical()
    };

    vec![
        protected("Get Accounts", HttpMethod::Get, "/accounts"),
        protected("Get Categories", HttpMethod::Get, "/categories"),
        protected("Get Transactions", HttpMethod::Get, "/transactions"),
        protected("Get Analytics", HttpMethod::Get, "/analytics"),
        protected("Export CSV", HttpMethod::Get, "/export?format=csv"),
        protected("Export Excel", HttpMethod::Get, "/export?format=xlsx"),
        protected("Create Account", HttpMethod::Post, "/accounts").json_body(json!({
            "name": "Test Account",
            "type": "BANK",
            "balance": 1000
        })),
        protected("Create Category", HttpMethod::Post, "/categories").json_body(json!({
            "name": "Test Category",
            "type": "EXPENSE"
        })),
        protected("Create Transaction", HttpMethod::Post, "/transactions").json_body(json!({
            "amount": 100,
            "description": "Test Transaction",
            "date": "2024-01-01",
            "accountId": "test-id",
            "categoryId": "test-id"
        })),
    ]
}

pub async fn run(ctx: &Context, log: &mut RunLog) {
    for spec in endpoints() {
        ctx.check(&spec, log).await;
    }
}
