use crate::models::TestResult;

/// Report categories as `(label, substring of the check name)`. First match wins.
pub const CATEGORIES: [(&str, &str); 10] = [
    ("Authentication Security", "Auth Security"),
    ("Response Structure", "Response Structure"),
    ("Content Types", "Content-Type"),
    ("Error Handling", "Error Handling"),
    ("CORS", "CORS"),
    ("Middleware", "Middleware"),
    ("Data Integrity", "Data Integrity"),
    ("Export", "Export"),
    ("Data Access", "Data Access"),
    ("Code Analysis", "Code Analysis"),
];

pub const OTHER_CATEGORY: &str = "Other";

pub fn category_of(test_name: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(_, needle)| test_name.contains(needle))
        .map(|(label, _)| *label)
        .unwrap_or(OTHER_CATEGORY)
}

/// Process exit status consumed by CI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    AllPassed,
    Failures,
    Critical,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::AllPassed => 0,
            ExitStatus::Failures => 1,
            ExitStatus::Critical => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTally {
    pub name: &'static str,
    pub passed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub critical_count: usize,
    pub categories: Vec<CategoryTally>,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let critical_count = results.iter().filter(|r| r.is_critical_issue()).count();

        let mut categories: Vec<CategoryTally> = CATEGORIES
            .iter()
            .map(|(label, _)| *label)
            .chain(std::iter::once(OTHER_CATEGORY))
            .map(|name| CategoryTally {
                name,
                passed: 0,
                total: 0,
            })
            .collect();

        for result in results {
            let name = category_of(&result.name);
            if let Some(tally) = categories.iter_mut().find(|t| t.name == name) {
                tally.total += 1;
                if result.passed {
                    tally.passed += 1;
                }
            }
        }
        categories.retain(|t| t.total > 0);

        Self {
            total,
            passed,
            failed: total - passed,
            critical_count,
            categories,
        }
    }

    /// Percentage of passed checks; an empty run reports 0.0.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }

    /// Critical failures take precedence over the plain failure count.
    pub fn exit_status(&self) -> ExitStatus {
        if self.critical_count > 0 {
            ExitStatus::Critical
        } else if self.failed > 0 {
            ExitStatus::Failures
        } else {
            ExitStatus::AllPassed
        }
    }
}
