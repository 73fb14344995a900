use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one assertion, before it is named and stamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
    pub details: Option<Value>,
    pub critical: bool,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            critical: false,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            critical: false,
        }
    }

    /// Pass when `condition` holds, otherwise fail. Picks the matching message.
    pub fn check(condition: bool, ok: impl Into<String>, not_ok: impl Into<String>) -> Self {
        if condition {
            Self::pass(ok)
        } else {
            Self::fail(not_ok)
        }
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn into_result(self, name: impl Into<String>) -> TestResult {
        TestResult {
            name: name.into(),
            passed: self.passed,
            message: self.message,
            details: self.details,
            critical: self.critical,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<Value>,
    pub critical: bool,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    /// A failed check that blocks release.
    pub fn is_critical_issue(&self) -> bool {
        self.critical && !self.passed
    }
}
