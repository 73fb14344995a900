use std::borrow::Cow;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::{Config, Credentials};
use crate::error::{truncate, HarnessError, HarnessResult};
use crate::models::{EndpointSpec, HttpMethod, Surface};

/// Body excerpts in messages are cut to this many characters.
pub const EXCERPT_CHARS: usize = 200;

/// Everything the server sent back, whatever the status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response by hand. Header pairs that are not valid HTTP are skipped.
    pub fn new(status: u16, headers: &[(&str, &str)], body: impl Into<Vec<u8>>) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                Some((
                    HeaderName::from_bytes(name.as_bytes()).ok()?,
                    HeaderValue::from_str(value).ok()?,
                ))
            })
            .collect();
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Header value as text, empty when missing or not UTF-8.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn excerpt(&self) -> String {
        truncate(&self.text(), EXCERPT_CHARS)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends one request per call against the server under test.
#[derive(Debug, Clone)]
pub struct Executor {
    client: Client,
    api_root: String,
    page_root: String,
    credentials: Credentials,
}

impl Executor {
    pub fn new(config: &Config) -> HarnessResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| HarnessError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_root: config.api_url(""),
            page_root: config.page_url(""),
            credentials: config.credentials.clone(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        !self.credentials.is_empty()
    }

    pub fn url_for(&self, surface: Surface, path: &str) -> String {
        match surface {
            Surface::Api => format!("{}{}", self.api_root, path),
            Surface::Page => format!("{}{}", self.page_root, path),
        }
    }

    pub async fn send(&self, spec: &EndpointSpec) -> HarnessResult<RawResponse> {
        let url = self.url_for(spec.surface, &spec.path);
        self.request(spec.method, &url, spec.body.as_ref(), spec.authenticated)
            .await
    }

    /// GET an API path, optionally as the configured user.
    pub async fn get_api(&self, path: &str, authenticated: bool) -> HarnessResult<RawResponse> {
        let url = self.url_for(Surface::Api, path);
        self.request(HttpMethod::Get, &url, None, authenticated).await
    }

    /// Non-2xx statuses are returned as responses; only transport failures error.
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        authenticated: bool,
    ) -> HarnessResult<RawResponse> {
        debug!(%method, url, authenticated, "Sending request");

        let mut request = self.client.request(method.into(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if authenticated {
            if let Some(token) = &self.credentials.bearer_token {
                request = request.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            if let Some(cookie) = &self.credentials.session_cookie {
                request = request.header(COOKIE, cookie.as_str());
            }
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        trace!(status, body_len = body.len(), "Received response");

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
