//! Shared test utilities for integration tests.
//!
//! `MockApp` serves an in-process imitation of the finance app on an
//! ephemeral port. Its `Behavior` flags break individual contracts so tests
//! can check that the harness notices.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use finprobe::config::Config;
use finprobe::models::XLSX_MIME;
use finprobe::run_log::RunLog;
use finprobe::suites::{self, Context, Suite};
use rust_xlsxwriter::Workbook;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "test-token";

pub const EXPORT_HEADERS: [&str; 7] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Subcategory",
    "Account",
    "Type",
];

/// Ways the mock can misbehave. The default is a fully conforming app.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    /// `GET /api/accounts` answers without checking credentials.
    pub leak_accounts: bool,
    /// `/dashboard` renders instead of redirecting to sign-in.
    pub open_dashboard: bool,
    /// Exports stop after this many transactions.
    pub export_limit: Option<usize>,
    /// Exported rows carry an empty `Account` cell.
    pub blank_account: bool,
    /// The default export format is XLSX instead of CSV.
    pub default_xlsx: bool,
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    transactions: Arc<Mutex<Vec<Value>>>,
}

fn seed_transactions() -> Vec<Value> {
    vec![
        json!({
            "id": "txn-1",
            "date": "2024-01-05",
            "description": "Coffee",
            "amount": -3.5,
            "category": "Food",
            "subcategory": "Cafe",
            "account": "Checking",
            "type": "EXPENSE"
        }),
        json!({
            "id": "txn-2",
            "date": "2024-01-31",
            "description": "Salary",
            "amount": 2500,
            "category": "Income",
            "subcategory": "",
            "account": "Checking",
            "type": "INCOME"
        }),
        json!({
            "id": "txn-3",
            "date": "2024-02-02",
            "description": "Rent, February",
            "amount": -900,
            "category": "Housing",
            "subcategory": "Rent",
            "account": "Checking",
            "type": "EXPENSE"
        }),
    ]
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": "Unauthorized" })),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": format!("{} not found", what) })),
    )
        .into_response()
}

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn list_accounts(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !state.behavior.leak_accounts && !authorized(&headers) {
        return unauthorized();
    }
    ok(json!([{ "id": "acc-1", "name": "Checking", "type": "BANK", "balance": 1000 }]))
}

async fn list_categories(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    ok(json!([{ "id": "cat-1", "name": "Food", "type": "EXPENSE" }]))
}

async fn list_transactions(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let transactions = state.transactions.lock().unwrap().clone();
    ok(json!({ "transactions": transactions, "total": transactions.len() }))
}

async fn analytics(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    ok(json!({ "income": 2500, "expenses": 903.5 }))
}

async fn create(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

async fn create_transaction(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    body["id"] = json!("txn-new");
    state.transactions.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(json!({ "success": true, "data": body }))).into_response()
}

async fn delete_transaction(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut transactions = state.transactions.lock().unwrap();
    let before = transactions.len();
    transactions.retain(|t| t["id"] != id.as_str());
    if transactions.len() == before {
        return not_found("Transaction");
    }
    ok(json!({ "id": id }))
}

async fn missing_record(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    not_found("Record")
}

async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, PUT, DELETE"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
        ],
    )
        .into_response()
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

fn export_rows(state: &MockState) -> Vec<Vec<String>> {
    let transactions = state.transactions.lock().unwrap().clone();
    let limit = state.behavior.export_limit.unwrap_or(transactions.len());
    transactions
        .iter()
        .take(limit)
        .map(|t| {
            let text = |key: &str| match &t[key] {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let account = if state.behavior.blank_account {
                String::new()
            } else {
                text("account")
            };
            vec![
                text("date"),
                text("description"),
                text("amount"),
                text("category"),
                text("subcategory"),
                account,
                text("type"),
            ]
        })
        .collect()
}

pub fn csv_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

pub fn xlsx_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Transactions").unwrap();
    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet
                .write_string(idx as u32 + 1, col as u16, value.as_str())
                .unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

async fn export(
    State(state): State<MockState>,
    headers: HeaderMap,
    query: axum::extract::Query<ExportQuery>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let default = if state.behavior.default_xlsx { "xlsx" } else { "csv" };
    let format = query.format.clone().unwrap_or_else(|| default.to_string());
    let rows = export_rows(&state);

    match format.as_str() {
        "csv" => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"transactions-2024.csv\"",
                ),
            ],
            csv_bytes(&rows),
        )
            .into_response(),
        "xlsx" => (
            [
                (header::CONTENT_TYPE, XLSX_MIME),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"transactions-2024.xlsx\"",
                ),
            ],
            xlsx_bytes(&rows),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Unsupported format" })),
        )
            .into_response(),
    }
}

async fn public_page() -> Html<&'static str> {
    Html("<html><body>Welcome</body></html>")
}

async fn protected_page() -> Redirect {
    Redirect::temporary("/sign-in?redirect_url=%2Fdashboard")
}

async fn fallback() -> Response {
    not_found("Route")
}

fn router(behavior: Behavior) -> Router {
    let dashboard = if behavior.open_dashboard {
        get(public_page)
    } else {
        get(protected_page)
    };
    let state = MockState {
        behavior,
        transactions: Arc::new(Mutex::new(seed_transactions())),
    };

    Router::new()
        .route(
            "/api/accounts",
            get(list_accounts).post(create).options(preflight),
        )
        .route("/api/categories", get(list_categories).post(create))
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/api/transactions/:id",
            axum::routing::put(missing_record).delete(delete_transaction),
        )
        .route(
            "/api/accounts/:id",
            axum::routing::put(missing_record).delete(missing_record),
        )
        .route("/api/categories/:id", axum::routing::put(missing_record))
        .route("/api/analytics", get(analytics))
        .route("/api/export", get(export))
        .route("/", get(public_page))
        .route("/sign-in", get(public_page))
        .route("/sign-up", get(public_page))
        .route("/dashboard", dashboard)
        .route("/transactions", get(protected_page))
        .route("/accounts", get(protected_page))
        .fallback(fallback)
        .with_state(state)
}

/// A running mock app. The server stops when this is dropped.
pub struct MockApp {
    pub port: u16,
    handle: JoinHandle<()>,
}

impl MockApp {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock app");
        let port = listener.local_addr().expect("No local address").port();
        let app = router(behavior);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });
        Self { port, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// A config for this app with credentials and only the given suites.
    pub fn config(&self, suites: &[Suite]) -> Config {
        let mut config = Config::for_base_url(&self.base_url()).expect("Valid base URL");
        config.credentials.bearer_token = Some(TOKEN.to_string());
        config.suites = suites.to_vec();
        config
    }
}

impl Drop for MockApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn run_suites(config: Config) -> RunLog {
    let ctx = Context::new(config).expect("Failed to build context");
    suites::run_all(&ctx).await
}

/// Look up a recorded check by name, panicking with the recorded names when absent.
pub fn find<'a>(log: &'a RunLog, name: &str) -> &'a finprobe::models::TestResult {
    log.results()
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = log.results().iter().map(|r| r.name.as_str()).collect();
            panic!("No check named '{}' in {:?}", name, names)
        })
}
