//! Environment provisioning that must succeed before any check runs.
//!
//! Talks to the application's ORM tooling through its CLI. Failures here are
//! preconditions, not check results.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

pub const ENV_FILE: &str = ".env.local";

/// `(variable, required)` pairs the application needs at runtime.
pub const EXPECTED_ENV: [(&str, bool); 5] = [
    ("NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY", true),
    ("CLERK_SECRET_KEY", true),
    ("DATABASE_URL", true),
    ("DIRECT_URL", true),
    ("RESEND_API_KEY", false),
];

const PLACEHOLDER: &str = "your_key_here";

const COUNT_SCRIPT: &str = r#"
const { PrismaClient } = require('@prisma/client');
const prisma = new PrismaClient();
(async () => {
  try {
    const [users, accounts, categories, transactions] = await Promise.all([
      prisma.user.count(), prisma.account.count(),
      prisma.category.count(), prisma.transaction.count(),
    ]);
    console.log(JSON.stringify({ users, accounts, categories, transactions }));
  } catch (e) {
    console.error('Error:', e.message);
    process.exitCode = 1;
  } finally {
    await prisma.$disconnect();
  }
})();
"#;

/// One external program invocation.
#[derive(Debug, Clone)]
pub struct FixtureCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl FixtureCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str).take(3))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct FixtureCommands {
    pub schema_push: FixtureCommand,
    pub seed: FixtureCommand,
    pub count_rows: FixtureCommand,
    pub timeout: Duration,
}

impl Default for FixtureCommands {
    fn default() -> Self {
        Self {
            schema_push: FixtureCommand::new("npx", &["prisma", "db", "push", "--accept-data-loss"]),
            seed: FixtureCommand::new("node", &["prisma/seed.js"]),
            count_rows: FixtureCommand::new("node", &["-e", COUNT_SCRIPT]),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RowCounts {
    pub users: u64,
    pub accounts: u64,
    pub categories: u64,
    pub transactions: u64,
}

#[derive(Debug, Clone)]
pub struct FixtureReport {
    pub missing_optional_env: Vec<String>,
    pub seeded: bool,
    pub counts: RowCounts,
}

/// Parse env-file content with dotenv semantics (`export` prefixes, quotes, inline comments).
pub fn parse_env_file(content: &str) -> HarnessResult<HashMap<String, String>> {
    dotenvy::from_read_iter(content.as_bytes())
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(|e| HarnessError::Fixture(format!("Invalid {}: {}", ENV_FILE, e)))
}

/// Split expected variables that are absent or placeholders into `(required, optional)`.
pub fn missing_env(vars: &HashMap<String, String>) -> (Vec<String>, Vec<String>) {
    let mut required = Vec::new();
    let mut optional = Vec::new();
    for (name, is_required) in EXPECTED_ENV {
        let configured = vars
            .get(name)
            .map(|v| v.trim())
            .map(|v| !v.is_empty() && v != PLACEHOLDER)
            .unwrap_or(false);
        if !configured {
            if is_required {
                required.push(name.to_string());
            } else {
                optional.push(name.to_string());
            }
        }
    }
    (required, optional)
}

pub fn parse_counts(stdout: &str) -> HarnessResult<RowCounts> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| HarnessError::Fixture("Could not parse verification output".into()))?;
    serde_json::from_str(line.trim()).map_err(|e| {
        HarnessError::Fixture(format!("Could not parse verification output: {}", e))
    })
}

async fn run(app_dir: &Path, command: &FixtureCommand, timeout: Duration) -> HarnessResult<String> {
    debug!(command = %command.display(), dir = %app_dir.display(), "Running fixture command");

    let output = tokio::time::timeout(
        timeout,
        Command::new(&command.program)
            .args(&command.args)
            .current_dir(app_dir)
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| {
        HarnessError::Fixture(format!(
            "'{}' timed out after {}s",
            command.display(),
            timeout.as_secs()
        ))
    })??;

    if !output.status.success() {
        return Err(HarnessError::Fixture(format!(
            "'{}' failed ({}): {}",
            command.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check the env file, sync the schema, optionally seed, and count rows.
pub async fn provision(
    app_dir: &Path,
    seed: bool,
    commands: &FixtureCommands,
) -> HarnessResult<FixtureReport> {
    let env_path = app_dir.join(ENV_FILE);
    let content = tokio::fs::read_to_string(&env_path).await.map_err(|e| {
        HarnessError::Fixture(format!("Failed to read {}: {}", env_path.display(), e))
    })?;
    let (missing_required, missing_optional) = missing_env(&parse_env_file(&content)?);
    if !missing_required.is_empty() {
        return Err(HarnessError::Fixture(format!(
            "Environment variables missing or placeholder in {}: {}",
            ENV_FILE,
            missing_required.join(", ")
        )));
    }
    for name in &missing_optional {
        warn!(variable = %name, "Optional environment variable not configured");
    }

    run(app_dir, &commands.schema_push, commands.timeout).await?;
    info!("Database schema synced");

    if seed {
        run(app_dir, &commands.seed, commands.timeout).await?;
        info!("Database seeded with demo data");
    }

    let counts = parse_counts(&run(app_dir, &commands.count_rows, commands.timeout).await?)?;
    info!(
        users = counts.users,
        accounts = counts.accounts,
        categories = counts.categories,
        transactions = counts.transactions,
        "Verified database contents"
    );

    Ok(FixtureReport {
        missing_optional_env: missing_optional,
        seeded: seed,
        counts,
    })
}
