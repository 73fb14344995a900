use std::io::{self, Write};
use std::path::Path;

use serde_json::json;

use crate::error::HarnessResult;
use crate::models::TestResult;
use crate::services::summary::{category_of, RunSummary};

const RULE: &str = "================================================================================";

/// Write the console report for a finished run.
pub fn render<W: Write>(out: &mut W, results: &[TestResult], summary: &RunSummary) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "CONFORMANCE RUN RESULTS")?;
    writeln!(out, "{}", RULE)?;

    for result in results {
        let status = if result.passed { "PASS" } else { "FAIL" };
        let priority = if result.critical && !result.passed {
            " [CRITICAL]"
        } else {
            ""
        };
        writeln!(out, "{}{}: {} - {}", status, priority, result.name, result.message)?;
    }

    writeln!(out)?;
    writeln!(out, "Total Tests: {}", summary.total)?;
    writeln!(out, "Passed: {}", summary.passed)?;
    writeln!(out, "Failed: {}", summary.failed)?;
    writeln!(out, "Critical Issues: {}", summary.critical_count)?;
    writeln!(out, "Success Rate: {:.1}%", summary.success_rate())?;

    for tally in &summary.categories {
        writeln!(out)?;
        writeln!(out, "{}: {}/{} passed", tally.name, tally.passed, tally.total)?;
        for result in results
            .iter()
            .filter(|r| !r.passed && category_of(&r.name) == tally.name)
        {
            let marker = if result.critical { "!!" } else { "- " };
            writeln!(out, "   {} {}: {}", marker, result.name, result.message)?;
        }
    }

    let critical: Vec<&TestResult> = results.iter().filter(|r| r.is_critical_issue()).collect();
    if !critical.is_empty() {
        writeln!(out)?;
        writeln!(out, "CRITICAL ISSUES REQUIRING IMMEDIATE ATTENTION:")?;
        for issue in &critical {
            writeln!(out, "   * {}", issue.name)?;
            writeln!(out, "     Problem: {}", issue.message)?;
            if let Some(details) = &issue.details {
                writeln!(out, "     Details: {}", details)?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "RECOMMENDATIONS:")?;
    for line in recommendations(&critical, summary) {
        writeln!(out, "   {}", line)?;
    }

    Ok(())
}

/// Advice derived from which categories the critical failures fall in.
pub fn recommendations(critical: &[&TestResult], summary: &RunSummary) -> Vec<&'static str> {
    if critical.is_empty() {
        return if summary.failed == 0 {
            vec!["All checks passed; the API honours its contract."]
        } else {
            vec!["Only non-critical issues found; the API should still work but consider fixing them."]
        };
    }

    let mut lines = Vec::new();
    let mut push = |line: &'static str| {
        if !lines.contains(&line) {
            lines.push(line);
        }
    };

    for issue in critical {
        match category_of(&issue.name) {
            "Authentication Security" => {
                push("Fix API endpoints that answer without requiring authentication.")
            }
            "Middleware" => push("Route protected pages through the sign-in redirect."),
            "Code Analysis" => push("Complete the authentication and user scoping in the API route source."),
            "Export" | "Data Integrity" => {
                push("Make exports complete: correct headers, all required columns, every transaction.")
            }
            "Data Access" => push("Restore the success envelope on authenticated data endpoints."),
            _ => push("Investigate the critical failures listed above."),
        }
    }

    lines
}

/// Write the full run as pretty JSON for machine consumers.
pub fn write_json(path: &Path, results: &[TestResult], summary: &RunSummary) -> HarnessResult<()> {
    let document = json!({
        "total": summary.total,
        "passed": summary.passed,
        "failed": summary.failed,
        "critical": summary.critical_count,
        "success_rate": summary.success_rate(),
        "exit_code": summary.exit_status().code(),
        "results": results,
    });
    std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}
