use crate::error::ConfigError;
use serde::Deserialize;
use tracing::debug;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "planner-tui";
const DEFAULT_URL: &str = "http://localhost:5000";
const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the planner backend, without the `/api` suffix.
    pub instance_url: String,
    /// Page size requested for every list.
    pub limit: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instance_url: DEFAULT_URL.to_string(),
            limit: DEFAULT_LIMIT,
            log_file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Reads `path`, or the default location when `path` is `None`. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Config::default_path() {
                Some(path) => (path, false),
                None => return Ok(Config::default()),
            },
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: Config =
            toml::from_str(&raw).map_err(|source| ConfigError::Toml { path, source })?;
        Ok(config)
    }

    /// Applies `PLANNER_URL` / `PLANNER_LIMIT` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PLANNER_URL") {
            self.instance_url = url;
        }
        if let Some(limit) = lookup("PLANNER_LIMIT") {
            self.limit = limit
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "PLANNER_LIMIT",
                    value: limit.clone(),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if self.limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "limit",
                value: self.limit.to_string(),
            });
        }
        Ok(())
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(env::temp_dir)
                .join(APP_DIR)
                .join("planner.log")
        })
    }
}
