//! Gateway configuration
//!
//! Configuration is layered: an optional YAML file, then environment
//! variables, then command-line flags. Every field has a default, so an empty
//! file is valid.

use crate::error::{Error, Result};
use crate::tracker::{
    RateLimiterConfig, TrackerClient, TrackerClientConfig, TrackerProject, DEFAULT_BASE_URL,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Complete gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port to listen on
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Extra directories published under `/public`
    #[serde(default)]
    pub public_dirs: Vec<PathBuf>,

    /// Email domains allowed to submit work requests
    #[serde(default)]
    pub domains: Vec<String>,

    /// Project tracker settings
    #[serde(default)]
    pub tracker: TrackerSettings,
}

fn default_listen_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            public_dirs: Vec::new(),
            domains: Vec::new(),
            tracker: TrackerSettings::default(),
        }
    }
}

/// Project tracker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// API token
    #[serde(default)]
    pub token: Option<String>,

    /// Project that work requests are filed in
    #[serde(default)]
    pub project_id: Option<u64>,

    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Outbound rate limit (disabled when absent)
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            token: None,
            project_id: None,
            base_url: default_base_url(),
            rate_limit: None,
        }
    }
}

impl TrackerSettings {
    /// Build the client, if a token is configured
    pub fn client(&self) -> Result<Option<TrackerClient>> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let mut config = TrackerClientConfig::new(token).base_url(&self.base_url);
        if let Some(rate_limit) = &self.rate_limit {
            config = config.rate_limit(rate_limit.clone());
        }
        TrackerClient::new(config).map(Some)
    }

    /// Build the project binding, if both token and project are configured
    pub fn project(&self) -> Result<Option<TrackerProject>> {
        Ok(self.client()?.and_then(|client| self.bind_project(client)))
    }

    /// Bind an existing client to the configured project
    pub fn bind_project(&self, client: TrackerClient) -> Option<TrackerProject> {
        self.project_id
            .map(|project_id| TrackerProject::new(client, project_id))
    }
}

impl GatewayConfig {
    /// Parse a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_yaml_str(&contents)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(&std::env::vars().collect())
    }

    /// Apply overrides from a set of environment variables
    ///
    /// - `LISTEN_PORT`: listen port
    /// - `PUBLIC_DIRS`: colon-separated directories
    /// - `DOMAINS`: comma-separated email domains
    /// - `PT_TOKEN`, `PT_PROJECT_ID`, `PT_BASE_URL`: tracker settings
    pub fn apply_vars(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        let var = |name: &str| vars.get(name).filter(|v| !v.is_empty());

        if let Some(port) = var("LISTEN_PORT") {
            self.listen_port = port
                .parse()
                .map_err(|e| Error::invalid_value("LISTEN_PORT", format!("{e}")))?;
        }
        if let Some(dirs) = var("PUBLIC_DIRS") {
            self.public_dirs = dirs
                .split(':')
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(domains) = var("DOMAINS") {
            self.domains = domains
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(token) = var("PT_TOKEN") {
            self.tracker.token = Some(token.clone());
        }
        if let Some(project) = var("PT_PROJECT_ID") {
            self.tracker.project_id = Some(
                project
                    .parse()
                    .map_err(|e| Error::invalid_value("PT_PROJECT_ID", format!("{e}")))?,
            );
        }
        if let Some(base_url) = var("PT_BASE_URL") {
            self.tracker.base_url = base_url.clone();
        }

        Ok(())
    }
}
