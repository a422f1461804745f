//! Project tracker HTTP client
//!
//! Thin wrapper over reqwest that:
//! - Resolves resource locators against the tracker API base URL
//! - Authenticates every request with the tracker token header
//! - Turns any non-2xx response into an error (no retries)
//! - Optionally rate limits outbound requests

use super::list::TrackerList;
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default tracker API root
pub const DEFAULT_BASE_URL: &str = "https://www.pivotaltracker.com/services/v5/";

/// Header carrying the API token
pub const TOKEN_HEADER: &str = "X-TrackerToken";

/// Configuration for the tracker client
#[derive(Debug, Clone)]
pub struct TrackerClientConfig {
    /// API root that resource locators are resolved against
    pub base_url: String,
    /// API token
    pub token: String,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for TrackerClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(30),
            rate_limit: None,
            user_agent: format!("tracker-gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TrackerClientConfig {
    /// Create a config for the given token against the default API root
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Set the API root
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set rate limiter
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }
}

/// Client for the project tracker REST API
///
/// Cheap to clone; clones share the connection pool and rate limiter.
#[derive(Clone)]
pub struct TrackerClient {
    client: Client,
    base_url: Url,
    token: String,
    timeout: Duration,
    rate_limiter: Option<RateLimiter>,
}

impl TrackerClient {
    /// Create a new client
    pub fn new(config: TrackerClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        // Url::join drops the last path segment unless the root ends in '/'
        let mut base = config.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            token: config.token,
            timeout: config.timeout,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
        })
    }

    /// API root resource locators are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Outbound rate limiter, if configured
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }

    /// Resolve a resource locator against the API root
    pub fn resolve(&self, uri: &str) -> Result<Url> {
        Ok(self.base_url.join(uri)?)
    }

    /// Issue a request and fail on any non-2xx status
    pub async fn request(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self
            .client
            .request(method.clone(), url.clone())
            .header(TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("unexpected response from tracker: {} [{}]", status.as_u16(), url);
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        debug!("Request succeeded: {} {}", method, url);
        Ok(response)
    }

    /// Lazily list every item under a resource, crossing upstream pages
    pub fn list(&self, uri: &str) -> Result<TrackerList> {
        Ok(TrackerList::new(self.clone(), self.resolve(uri)?))
    }

    /// List all projects visible to the token
    pub fn projects(&self) -> Result<TrackerList> {
        self.list("projects")
    }

    /// List the stories of a project
    pub fn stories(&self, project: u64) -> Result<TrackerList> {
        self.list(&format!("projects/{project}/stories"))
    }

    /// Create a chore story in a project and return the created story
    pub async fn create_chore(&self, project: u64, name: &str, description: &str) -> Result<Value> {
        let url = self.resolve(&format!("projects/{project}/stories"))?;
        let body = json!({
            "name": name,
            "description": description,
            "story_type": "chore",
        });

        let response = self.request(Method::POST, url, Some(&body)).await?;
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for TrackerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// A tracker client bound to a single project
#[derive(Debug, Clone)]
pub struct TrackerProject {
    client: TrackerClient,
    project: u64,
}

impl TrackerProject {
    /// Bind a client to a project
    pub fn new(client: TrackerClient, project: u64) -> Self {
        Self { client, project }
    }

    /// Project id
    pub fn id(&self) -> u64 {
        self.project
    }

    /// Underlying client
    pub fn client(&self) -> &TrackerClient {
        &self.client
    }

    /// Create a chore in this project
    pub async fn create_chore(&self, name: &str, description: &str) -> Result<Value> {
        self.client.create_chore(self.project, name, description).await
    }

    /// List the stories of this project
    pub fn stories(&self) -> Result<TrackerList> {
        self.client.stories(self.project)
    }
}
