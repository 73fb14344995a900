use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};
use crate::suites::Suite;

/// How an unauthenticated `200` without data is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Protected endpoints must answer `401 Unauthorized`.
    Strict,
    /// A `200` carrying no data is accepted for protected endpoints.
    Lenient,
}

impl AuthPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(AuthPolicy::Strict),
            "lenient" => Some(AuthPolicy::Lenient),
            _ => None,
        }
    }
}

/// Credentials attached to checks that run as a signed-in user.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub bearer_token: Option<String>,
    pub session_cookie: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.bearer_token.is_none() && self.session_cookie.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_prefix: String,
    pub timeout: Duration,
    pub credentials: Credentials,
    pub auth_policy: AuthPolicy,
    pub suites: Vec<Suite>,
    pub critical_transport: bool,
    pub source_path: Option<PathBuf>,
    pub app_dir: Option<PathBuf>,
    pub seed: bool,
    pub report_json: Option<PathBuf>,
}

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

impl Config {
    pub fn from_env() -> HarnessResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars<F>(lookup: F) -> HarnessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = var("FINPROBE_BASE_URL")
            .or_else(|| var("NEXT_PUBLIC_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(HarnessError::Config(format!(
                "Base URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let api_prefix = var("FINPROBE_API_PREFIX").unwrap_or_else(|| "/api".into());
        let api_prefix = format!("/{}", api_prefix.trim().trim_matches('/'));
        let api_prefix = if api_prefix == "/" {
            String::new()
        } else {
            api_prefix
        };

        let timeout_secs = match var("FINPROBE_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    HarnessError::Config(format!("Invalid FINPROBE_TIMEOUT_SECS: '{}'", v))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let auth_policy = match var("FINPROBE_AUTH_POLICY") {
            Some(v) => AuthPolicy::parse(&v).ok_or_else(|| {
                HarnessError::Config(format!(
                    "Invalid FINPROBE_AUTH_POLICY: must be 'strict' or 'lenient'. Got: {}",
                    v
                ))
            })?,
            None => AuthPolicy::Strict,
        };

        let suites = match var("FINPROBE_SUITES") {
            Some(v) => parse_suites(&v)?,
            None => Suite::ALL.to_vec(),
        };

        Ok(Self {
            base_url,
            api_prefix,
            timeout: Duration::from_secs(timeout_secs),
            credentials: Credentials {
                bearer_token: var("FINPROBE_AUTH_TOKEN"),
                session_cookie: var("FINPROBE_SESSION_COOKIE"),
            },
            auth_policy,
            suites,
            critical_transport: var("FINPROBE_CRITICAL_TRANSPORT")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            source_path: var("FINPROBE_SOURCE_PATH").map(PathBuf::from),
            app_dir: var("FINPROBE_APP_DIR").map(PathBuf::from),
            seed: var("FINPROBE_SEED").map(|v| parse_flag(&v)).unwrap_or(false),
            report_json: var("FINPROBE_REPORT_JSON").map(PathBuf::from),
        })
    }

    /// A config pointing at `base_url` with every other setting at its default.
    pub fn for_base_url(base_url: &str) -> HarnessResult<Self> {
        let base_url = base_url.to_string();
        Self::from_vars(move |key| (key == "FINPROBE_BASE_URL").then(|| base_url.clone()))
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    pub fn page_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_suites(value: &str) -> HarnessResult<Vec<Suite>> {
    let mut suites = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let suite = Suite::parse(name)
            .ok_or_else(|| HarnessError::Config(format!("Unknown suite '{}'", name)))?;
        if !suites.contains(&suite) {
            suites.push(suite);
        }
    }
    // Keep the canonical execution order regardless of how they were listed.
    suites.sort_by_key(|s| Suite::ALL.iter().position(|a| a == s));
    Ok(suites)
}
