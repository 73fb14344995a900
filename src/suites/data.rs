//! Authenticated round trips through the data endpoints.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::models::{EndpointSpec, HttpMethod, Shape, Verdict};
use crate::run_log::RunLog;
use crate::services::executor::RawResponse;
use crate::suites::Context;

const READS: [(&str, &str); 4] = [
    ("Get Accounts", "/accounts"),
    ("Get Categories", "/categories"),
    ("Get Transactions", "/transactions"),
    ("Get Analytics", "/analytics"),
];

/// `id` of the first element of a listing, whether `data` is the array or wraps it.
pub fn first_id(response: &RawResponse, collection: &str) -> Option<String> {
    let body = response.json().ok()?;
    let data = body.get("data")?;
    let items = match data {
        Value::Array(items) => items,
        _ => data.get(collection)?.as_array()?,
    };
    match items.first()?.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub async fn run(ctx: &Context, log: &mut RunLog) {
    if !ctx.executor.has_credentials() {
        info!("No credentials configured, skipping authenticated data checks");
        return;
    }

    let mut accounts = None;
    let mut categories = None;
    for (name, path) in READS {
        let spec = EndpointSpec::api(format!("Data Access - {}", name), HttpMethod::Get, path)
            .expect(Shape::SuccessEnvelope)
            .authenticated();
        let response = ctx.check(&spec, log).await;
        match path {
            "/accounts" => accounts = response,
            "/categories" => categories = response,
            _ => {}
        }
    }

    let account_id = accounts.as_ref().and_then(|r| first_id(r, "accounts"));
    let category_id = categories.as_ref().and_then(|r| first_id(r, "categories"));
    let (Some(account_id), Some(category_id)) = (account_id, category_id) else {
        warn!("No account or category to attach a transaction to, skipping write checks");
        return;
    };

    let description = format!("finprobe {}", uuid::Uuid::new_v4());
    let create = EndpointSpec::api("Data Access - Create Transaction", HttpMethod::Post, "/transactions")
        .expect(Shape::SuccessEnvelope)
        .statuses(&[200, 201])
        .authenticated()
        .json_body(json!({
            "amount": 1,
            "description": description,
            "date": Utc::now().format("%Y-%m-%d").to_string(),
            "accountId": account_id,
            "categoryId": category_id,
        }));

    let Some(created) = ctx.check(&create, log).await else {
        return;
    };
    let Some(id) = created
        .json()
        .ok()
        .and_then(|body| body.pointer("/data/id").cloned())
        .and_then(|id| match id {
            Value::String(id) => Some(id),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
    else {
        if created.status < 300 {
            log.record(
                "Data Access - Delete Transaction",
                Verdict::fail("Created transaction has no id to delete")
                    .with_details(created.excerpt()),
            );
        }
        return;
    };

    let delete = EndpointSpec::api(
        "Data Access - Delete Transaction",
        HttpMethod::Delete,
        format!("/transactions/{}", urlencoding::encode(&id)),
    )
    .expect(Shape::SuccessEnvelope)
    .statuses(&[200, 204])
    .authenticated();
    ctx.check(&delete, log).await;
}
