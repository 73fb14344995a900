//! Static fingerprinting of the application's API route source.
//!
//! These checks look for literal patterns rather than behaviour, so they only
//! run when a source path is configured and they never replace the HTTP
//! checks.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::models::Verdict;

/// Characters after a `findMany` call searched for a `where:` clause.
const FIND_MANY_WINDOW: usize = 200;

static AUTH_HELPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"async\s+function\s+getAuthenticatedUser\s*\(").expect("auth helper pattern is valid")
});

static SUCCESS_ENVELOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"success:\s*true,\s*data:").expect("success envelope pattern is valid")
});

static ERROR_ENVELOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"success:\s*false,\s*error:").expect("error envelope pattern is valid")
});

#[derive(Debug, Clone)]
pub enum Pattern {
    Contains(&'static str),
    CountAtLeast(&'static str, usize),
    Matches(&'static LazyLock<Regex>),
    /// Every `findMany` call scoped by a `where:` clause, at least this many times.
    ScopedFindMany(usize),
    All(&'static [Pattern]),
}

impl Pattern {
    pub fn holds(&self, source: &str) -> bool {
        match self {
            Pattern::Contains(needle) => source.contains(needle),
            Pattern::CountAtLeast(needle, min) => source.matches(needle).count() >= *min,
            Pattern::Matches(re) => re.is_match(source),
            Pattern::ScopedFindMany(min) => {
                let (scoped, _) = scoped_find_many(source);
                scoped >= *min
            }
            Pattern::All(patterns) => patterns.iter().all(|p| p.holds(source)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceCheck {
    pub name: &'static str,
    pub pattern: Pattern,
    pub present: &'static str,
    pub absent: &'static str,
}

pub const REQUIRED_HANDLERS: [&str; 8] = [
    "getAccounts",
    "getCategories",
    "getTransactions",
    "getAnalytics",
    "exportTransactions",
    "createAccount",
    "createCategory",
    "createTransaction",
];

pub fn default_checks() -> Vec<SourceCheck> {
    vec![
        SourceCheck {
            name: "Code Analysis - Auth Import",
            pattern: Pattern::Contains("@clerk/nextjs"),
            present: "API routes import the identity provider SDK",
            absent: "Missing identity provider import",
        },
        SourceCheck {
            name: "Code Analysis - Auth Helper Function",
            pattern: Pattern::Matches(&AUTH_HELPER),
            present: "getAuthenticatedUser helper function exists",
            absent: "Missing getAuthenticatedUser helper function",
        },
        SourceCheck {
            name: "Code Analysis - Auth Usage",
            pattern: Pattern::All(&[Pattern::Contains("auth()"), Pattern::Contains("userId")]),
            present: "Uses auth() to resolve the userId",
            absent: "Missing auth() usage",
        },
        SourceCheck {
            name: "Code Analysis - User Creation",
            pattern: Pattern::All(&[
                Pattern::Contains("prisma.user.create"),
                Pattern::Contains("clerkId: userId"),
            ]),
            present: "Creates a user record for new identities",
            absent: "Missing user creation logic",
        },
        SourceCheck {
            name: "Code Analysis - User ID Filtering",
            pattern: Pattern::CountAtLeast("userId: user.id", 5),
            present: "Database queries filter by userId",
            absent: "Insufficient userId filtering in database queries",
        },
        SourceCheck {
            name: "Code Analysis - Ownership Verification",
            pattern: Pattern::All(&[
                Pattern::Contains("findFirst"),
                Pattern::Contains("userId: user.id"),
            ]),
            present: "Updates and deletes verify ownership",
            absent: "Missing ownership verification",
        },
        SourceCheck {
            name: "Code Analysis - 401 Responses",
            pattern: Pattern::CountAtLeast("status: 401", 3),
            present: "Returns 401 for unauthorized requests",
            absent: "Insufficient 401 responses",
        },
        SourceCheck {
            name: "Code Analysis - Success Envelope",
            pattern: Pattern::Matches(&SUCCESS_ENVELOPE),
            present: "Success responses use { success: true, data }",
            absent: "Success responses do not follow the envelope",
        },
        SourceCheck {
            name: "Code Analysis - Error Envelope",
            pattern: Pattern::Matches(&ERROR_ENVELOPE),
            present: "Error responses use { success: false, error }",
            absent: "Error responses do not follow the envelope",
        },
        SourceCheck {
            name: "Code Analysis - Scoped Queries",
            pattern: Pattern::ScopedFindMany(3),
            present: "findMany queries carry where clauses",
            absent: "Some findMany queries lack where clauses",
        },
    ]
}

/// Returns `(scoped, total)` counts of `findMany` calls.
pub fn scoped_find_many(source: &str) -> (usize, usize) {
    let mut scoped = 0;
    let mut total = 0;
    for (idx, _) in source.match_indices("findMany") {
        total += 1;
        let window: String = source[idx..].chars().take(FIND_MANY_WINDOW).collect();
        if window.contains("where:") {
            scoped += 1;
        }
    }
    (scoped, total)
}

pub fn missing_handlers(source: &str) -> Vec<&'static str> {
    REQUIRED_HANDLERS
        .iter()
        .copied()
        .filter(|name| !source.contains(name))
        .collect()
}

/// Evaluate every check against the source text. All results are critical.
pub fn analyze(source: &str, checks: &[SourceCheck]) -> Vec<(String, Verdict)> {
    let mut verdicts: Vec<(String, Verdict)> = checks
        .iter()
        .map(|check| {
            let verdict = Verdict::check(check.pattern.holds(source), check.present, check.absent)
                .critical(true);
            (check.name.to_string(), verdict)
        })
        .collect();

    let missing = missing_handlers(source);
    let verdict = if missing.is_empty() {
        Verdict::pass("All required handlers implemented")
    } else {
        Verdict::fail(format!("Missing handlers: {}", missing.join(", ")))
    };
    verdicts.push((
        "Code Analysis - Required Endpoints".to_string(),
        verdict.critical(true).with_details(json!({ "missing": missing })),
    ));

    verdicts
}
