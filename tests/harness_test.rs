//! End-to-end runs of the check suites against the mock app.

mod common;

use common::{find, run_suites, Behavior, MockApp};
use finprobe::config::{AuthPolicy, Config};
use finprobe::services::report;
use finprobe::services::summary::{ExitStatus, RunSummary};
use finprobe::suites::Suite;

#[tokio::test]
async fn test_conforming_app_passes_every_suite() {
    let app = MockApp::start(Behavior::default()).await;
    let log = run_suites(app.config(&Suite::ALL)).await;

    let failures: Vec<_> = log
        .results()
        .iter()
        .filter(|r| !r.passed)
        .map(|r| format!("{}: {}", r.name, r.message))
        .collect();
    assert!(failures.is_empty(), "Unexpected failures: {:#?}", failures);

    // 9 auth, 4 structure, 6 content-type, 5 error, 1 CORS, 6 middleware, 9 export, 6 data.
    assert_eq!(log.len(), 46);

    let summary = RunSummary::from_results(log.results());
    assert_eq!(summary.exit_status(), ExitStatus::AllPassed);
    assert_eq!(summary.exit_status().code(), 0);
}

#[tokio::test]
async fn test_checks_are_recorded_in_suite_order() {
    let app = MockApp::start(Behavior::default()).await;
    let log = run_suites(app.config(&[Suite::Cors, Suite::Auth])).await;

    // The config sorts suites; a hand-built one runs in the order given.
    let names: Vec<&str> = log.results().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names[0], "CORS - Preflight");
    assert_eq!(names[1], "Auth Security - Get Accounts");
    assert_eq!(*names.last().unwrap(), "Auth Security - Create Transaction");
}

#[tokio::test]
async fn test_leaking_endpoint_is_critical() {
    let app = MockApp::start(Behavior {
        leak_accounts: true,
        ..Behavior::default()
    })
    .await;
    let log = run_suites(app.config(&[Suite::Auth, Suite::Structure])).await;

    let leak = find(&log, "Auth Security - Get Accounts");
    assert!(!leak.passed);
    assert!(leak.critical);
    assert!(leak.message.contains("CRITICAL SECURITY ISSUE"));

    let structure = find(&log, "Response Structure - Get Accounts");
    assert!(!structure.passed);
    assert!(!structure.critical);

    assert_eq!(log.critical_issues().count(), 1);
    let summary = RunSummary::from_results(log.results());
    assert_eq!(summary.exit_status().code(), 2);

    let mut out = Vec::new();
    report::render(&mut out, log.results(), &summary).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("CRITICAL ISSUES REQUIRING IMMEDIATE ATTENTION:"));
    assert!(text.contains("   * Auth Security - Get Accounts"));
    assert!(text.contains("Fix API endpoints that answer without requiring authentication."));
}

#[tokio::test]
async fn test_open_protected_page_is_critical() {
    let app = MockApp::start(Behavior {
        open_dashboard: true,
        ..Behavior::default()
    })
    .await;
    let log = run_suites(app.config(&[Suite::Middleware])).await;

    let dashboard = find(&log, "Middleware - Protected Route /dashboard");
    assert!(!dashboard.passed);
    assert!(dashboard.critical);
    assert!(find(&log, "Middleware - Protected Route /accounts").passed);
    assert!(find(&log, "Middleware - Public Route /sign-in").passed);
}

#[tokio::test]
async fn test_data_suite_skipped_without_credentials() {
    let app = MockApp::start(Behavior::default()).await;
    let mut config = app.config(&[Suite::Data]);
    config.credentials.bearer_token = None;

    let log = run_suites(config).await;
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_data_suite_creates_and_deletes_transaction() {
    let app = MockApp::start(Behavior::default()).await;
    let log = run_suites(app.config(&[Suite::Data])).await;

    assert!(find(&log, "Data Access - Create Transaction").passed);
    assert!(find(&log, "Data Access - Delete Transaction").passed);
    assert_eq!(log.len(), 6);
}

#[tokio::test]
async fn test_unreachable_server_fails_without_critical() {
    let mut config = Config::for_base_url("http://127.0.0.1:1").unwrap();
    config.suites = vec![Suite::Auth];

    let log = run_suites(config).await;
    assert_eq!(log.len(), 9);
    for result in log.results() {
        assert!(!result.passed);
        assert!(!result.critical, "{} should not be critical", result.name);
        assert_eq!(result.message, "Request failed");
    }
    let summary = RunSummary::from_results(log.results());
    assert_eq!(summary.exit_status(), ExitStatus::Failures);
}

#[tokio::test]
async fn test_unreachable_server_critical_when_configured() {
    let mut config = Config::for_base_url("http://127.0.0.1:1").unwrap();
    config.suites = vec![Suite::Cors];
    config.critical_transport = true;

    let log = run_suites(config).await;
    let summary = RunSummary::from_results(log.results());
    assert_eq!(summary.exit_status().code(), 2);
}

#[tokio::test]
async fn test_source_suite_reports_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::for_base_url("http://127.0.0.1:1").unwrap();
    config.suites = vec![Suite::Source];
    config.source_path = Some(dir.path().join("missing.ts"));

    let log = run_suites(config).await;
    let access = find(&log, "Code Analysis - File Access");
    assert!(!access.passed);
    assert!(access.critical);
}

#[tokio::test]
async fn test_lenient_policy_is_configurable() {
    let config = Config::from_vars(|key| match key {
        "FINPROBE_AUTH_POLICY" => Some("lenient".into()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.auth_policy, AuthPolicy::Lenient);
}
