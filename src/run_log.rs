use tracing::{error, info, warn};

use crate::models::{TestResult, Verdict};

/// Ordered, append-only record of one harness run.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    results: Vec<TestResult>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name, stamp and append a verdict.
    pub fn record(&mut self, name: impl Into<String>, verdict: Verdict) -> &TestResult {
        let result = verdict.into_result(name);

        if result.passed {
            info!(test = %result.name, "PASS: {}", result.message);
        } else if result.critical {
            error!(test = %result.name, details = ?result.details, "FAIL [CRITICAL]: {}", result.message);
        } else {
            warn!(test = %result.name, details = ?result.details, "FAIL: {}", result.message);
        }

        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Failed checks flagged critical, in recording order.
    pub fn critical_issues(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| r.is_critical_issue())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
