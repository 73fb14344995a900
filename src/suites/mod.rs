pub mod auth;
pub mod content_types;
pub mod cors;
pub mod data;
pub mod errors;
pub mod export;
pub mod middleware;
pub mod source;
pub mod structure;

use tracing::info;

use crate::config::Config;
use crate::error::HarnessResult;
use crate::models::EndpointSpec;
use crate::run_log::RunLog;
use crate::services::classifier::{classify, request_failed};
use crate::services::executor::{Executor, RawResponse};

/// A named group of checks. Variants are listed in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Auth,
    Structure,
    ContentTypes,
    Errors,
    Cors,
    Middleware,
    Export,
    Data,
    Source,
}

impl Suite {
    pub const ALL: [Suite; 9] = [
        Suite::Auth,
        Suite::Structure,
        Suite::ContentTypes,
        Suite::Errors,
        Suite::Cors,
        Suite::Middleware,
        Suite::Export,
        Suite::Data,
        Suite::Source,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Auth => "auth",
            Suite::Structure => "structure",
            Suite::ContentTypes => "content-types",
            Suite::Errors => "errors",
            Suite::Cors => "cors",
            Suite::Middleware => "middleware",
            Suite::Export => "export",
            Suite::Data => "data",
            Suite::Source => "source",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Suite::ALL.into_iter().find(|suite| suite.as_str() == s)
    }
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What every check needs: where to send requests and how to judge them.
pub struct Context {
    pub config: Config,
    pub executor: Executor,
}

impl Context {
    pub fn new(config: Config) -> HarnessResult<Self> {
        let executor = Executor::new(&config)?;
        Ok(Self { config, executor })
    }

    /// Send, classify and record one endpoint check.
    ///
    /// Returns the response so dependent checks can build on it.
    pub async fn check(&self, spec: &EndpointSpec, log: &mut RunLog) -> Option<RawResponse> {
        match self.executor.send(spec).await {
            Ok(response) => {
                log.record(&spec.name, classify(spec, &response, self.config.auth_policy));
                Some(response)
            }
            Err(e) => {
                self.record_transport_failure(&spec.name, &e, log);
                None
            }
        }
    }

    pub fn record_transport_failure(
        &self,
        name: &str,
        error: &crate::error::HarnessError,
        log: &mut RunLog,
    ) {
        log.record(name, request_failed(error, self.config.critical_transport));
    }
}

/// Run the configured suites in order, threading one log through all of them.
pub async fn run_all(ctx: &Context) -> RunLog {
    let mut log = RunLog::new();

    for suite in &ctx.config.suites {
        info!(%suite, "Running suite");
        let before = log.len();
        match suite {
            Suite::Auth => auth::run(ctx, &mut log).await,
            Suite::Structure => structure::run(ctx, &mut log).await,
            Suite::ContentTypes => content_types::run(ctx, &mut log).await,
            Suite::Errors => errors::run(ctx, &mut log).await,
            Suite::Cors => cors::run(ctx, &mut log).await,
            Suite::Middleware => middleware::run(ctx, &mut log).await,
            Suite::Export => export::run(ctx, &mut log).await,
            Suite::Data => data::run(ctx, &mut log).await,
            Suite::Source => source::run(ctx, &mut log).await,
        }
        info!(%suite, checks = log.len() - before, "Suite finished");
    }

    log
}
