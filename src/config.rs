//! Client configuration.
//!
//! Read from `config.toml` in the platform config dir; every field is
//! optional. `SHELLSQUID_SERVER` and `SHELLSQUID_TOKEN_PATH` override the
//! file.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SERVER_ENV: &str = "SHELLSQUID_SERVER";
pub const TOKEN_PATH_ENV: &str = "SHELLSQUID_TOKEN_PATH";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4443";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the shellsquid API.
    pub server_url: String,
    /// Token slot location; `~` is expanded. Defaults to `<data dir>/token`.
    pub token_path: Option<String>,
    pub success_message_ttl_ms: u64,
    /// Per-request timeout. Unset means requests never time out.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            token_path: None,
            success_message_ttl_ms: 2000,
            request_timeout_secs: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "shellsquid", "shellsquid")
}

impl ClientConfig {
    /// `config.toml` in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path` (or the default location) and apply env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from(&path)?,
            None => {
                tracing::warn!("no config directory on this platform; using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("config file {} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Apply overrides from `lookup` (the process env in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server) = lookup(SERVER_ENV).filter(|v| !v.trim().is_empty()) {
            self.server_url = server.trim().to_string();
        }
        if let Some(path) = lookup(TOKEN_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.token_path = Some(path.trim().to_string());
        }
    }

    /// Where the token slot lives.
    pub fn resolved_token_path(&self) -> Result<PathBuf> {
        if let Some(raw) = &self.token_path {
            return Ok(PathBuf::from(shellexpand::tilde(raw).as_ref()));
        }
        let dirs = project_dirs().context("Could not determine a data directory for the token")?;
        Ok(dirs.data_dir().join(crate::session::store::TOKEN_SLOT))
    }

    pub fn success_ttl(&self) -> Duration {
        Duration::from_millis(self.success_message_ttl_ms)
    }

    /// HTTP client honouring `request_timeout_secs`.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build().context("Failed to build HTTP client")
    }
}
