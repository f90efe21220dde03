//! Configuration: target service and scenario knobs
//!
//! Values come from an optional TOML file under the user config directory,
//! with CLI flags taking precedence over it and defaults below both.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_PUSH_URL: &str = "http://localhost/push";
const DEFAULT_CALLER_ID: &str = "alexis@mozilla.com";
const DEFAULT_WAIT_BUDGET_SECS: u64 = 60;

/// Probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the service under test.
    pub server_url: String,
    /// Simple-push URL sent at registration.
    pub simple_push_url: String,
    /// Caller identity used when generating call URLs.
    pub caller_id: String,
    /// Client-side watchdog over one scenario iteration. Must sit above the
    /// server's own supervisory/ringing/connection timeouts.
    pub wait_budget_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            simple_push_url: DEFAULT_PUSH_URL.to_string(),
            caller_id: DEFAULT_CALLER_ID.to_string(),
            wait_budget_secs: DEFAULT_WAIT_BUDGET_SECS,
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "callbench", "callbench")
            .context("could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from disk, falling back to defaults when no file
    /// exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config file")
    }

    /// Apply CLI overrides on top of whatever was loaded.
    pub fn with_overrides(mut self, server: Option<String>, push_url: Option<String>) -> Self {
        if let Some(server) = server {
            self.server_url = server;
        }
        if let Some(push_url) = push_url {
            self.simple_push_url = push_url;
        }
        self
    }

    pub fn wait_budget(&self) -> Duration {
        Duration::from_secs(self.wait_budget_secs)
    }
}
