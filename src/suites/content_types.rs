use crate::models::{EndpointSpec, ExportFormat, HttpMethod, Shape};
use crate::run_log::RunLog;
use crate::suites::Context;

const JSON: &str = "application/json";

pub fn endpoints() -> Vec<EndpointSpec> {
    let expect = |name: &str, path: &str, mime: &'static str| {
        EndpointSpec::api(format!("Content-Type - {}", name), HttpMethod::Get, path)
            .expect(Shape::ContentType(mime))
    };

    vec![
        expect("Accounts API", "/accounts", JSON),
        expect("Categories API", "/categories", JSON),
        expect("Transactions API", "/transactions", JSON),
        expect("Analytics API", "/analytics", JSON),
        expect("CSV Export", "/export?format=csv", ExportFormat::Csv.content_type()),
        expect("Excel Export", "/export?format=xlsx", ExportFormat::Xlsx.content_type()),
    ]
}

pub async fn run(ctx: &Context, log: &mut RunLog) {
    for spec in endpoints() {
        ctx.check(&spec, log).await;
    }
}
