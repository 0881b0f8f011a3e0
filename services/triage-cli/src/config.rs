//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! A missing config file is not an error; every setting has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use triage_auth::DEFAULT_API_URL;
use triage_client::ClientConfig;

const DEFAULT_CONFIG_FILE: &str = "triage.toml";
const DEFAULT_TOKEN_FILE: &str = ".config/triage/session.json";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where the token pair is persisted
#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    /// Defaults to `~/.config/triage/session.json`
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// `TRIAGE_API_URL` overrides `api.base_url` from the file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let mut config: Config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("TRIAGE_API_URL") {
            config.api.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI flags on top of file and env settings, then re-validate.
    pub fn apply_overrides(
        &mut self,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> common::Result<()> {
        if let Some(url) = base_url {
            self.api.base_url = url;
        }
        if let Some(secs) = timeout_secs {
            self.api.timeout_secs = secs;
        }
        self.validate()
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Token file from config, else under `$HOME`, else the working directory.
    pub fn token_file(&self) -> PathBuf {
        if let Some(path) = &self.session.token_file {
            return path.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(DEFAULT_TOKEN_FILE),
            None => PathBuf::from("triage-session.json"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }
}
