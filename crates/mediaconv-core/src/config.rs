//! Configuration module
//!
//! Client settings are read from the environment (after loading `.env`).
//! Command-line flags may override individual values afterwards.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_OUTPUT_DIR: &str = ".";

/// Settings for talking to the conversion service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the conversion service, without trailing slash
    pub backend_url: String,
    /// Per-request transport timeout in seconds. 0 = disabled.
    pub request_timeout_secs: u64,
    /// Directory where downloaded artifacts are written
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: 0,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ClientConfig {
    /// Load from `.env` and the process environment.
    ///
    /// Reads MEDIACONV_BACKEND_URL (or BACKEND_URL), MEDIACONV_REQUEST_TIMEOUT_SECS
    /// and MEDIACONV_OUTPUT_DIR.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("MEDIACONV_BACKEND_URL")
            .or_else(|| lookup("BACKEND_URL"))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let request_timeout_secs = match lookup("MEDIACONV_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("MEDIACONV_REQUEST_TIMEOUT_SECS must be a whole number of seconds")
            })?,
            None => 0,
        };

        let output_dir = lookup("MEDIACONV_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let config = ClientConfig {
            backend_url: normalize_backend_url(&backend_url)?,
            request_timeout_secs,
            output_dir,
        };
        Ok(config)
    }

    /// Replace the backend URL, validating it the same way as the environment value.
    pub fn with_backend_url(mut self, backend_url: &str) -> Result<Self, anyhow::Error> {
        self.backend_url = normalize_backend_url(backend_url)?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }
}

fn normalize_backend_url(raw: &str) -> Result<String, anyhow::Error> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Backend URL must start with http:// or https://, got '{}'",
                raw
            )
        })?;
    if host.is_empty() {
        return Err(anyhow::anyhow!("Backend URL '{}' has no host", raw));
    }
    Ok(trimmed.to_string())
}
