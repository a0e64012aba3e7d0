//! Launcher configuration.
//!
//! Configuration lives in TOML files with two tables:
//!
//! ```toml
//! [scrapyd]
//! dbs_dir = "dbs"
//! eggs_dir = "eggs"
//! runner = "scrapyd.runner"
//!
//! [settings]
//! news = "news.settings"
//! ```
//!
//! `[scrapyd]` holds scalar options looked up with defaults. The keys of
//! `[settings]` name statically configured projects; the table is optional.
//!
//! File selection rules for [`Config::load`]:
//! - If `SCRAPYD_CONFIG` is set: read only that file, which must exist
//! - Otherwise: merge `/etc/scrapyd/scrapyd.toml`, `~/.scrapyd.toml` and
//!   `./scrapyd.toml`, later files overriding earlier keys
//!
//! Missing files in the standard locations are skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use db::QueueBackend;
use serde::Deserialize;

use crate::LauncherError;

/// Environment variable selecting a single config file.
pub const CONFIG_ENV: &str = "SCRAPYD_CONFIG";

pub const DEFAULT_DBS_DIR: &str = "dbs";
pub const DEFAULT_EGGS_DIR: &str = "eggs";
pub const DEFAULT_RUNNER: &str = "scrapyd.runner";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_LIST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    scrapyd: toml::Table,
    #[serde(default)]
    settings: Option<toml::Table>,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load the config from the standard locations.
    pub fn load() -> Result<Self, LauncherError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_required(path);
        }

        let mut config = Self::default();
        for path in default_paths() {
            config.merge(Self::load_from_file(&path)?);
        }
        Ok(config)
    }

    /// Load a file the user chose explicitly. A missing file is an error.
    pub fn load_required(path: impl AsRef<Path>) -> Result<Self, LauncherError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LauncherError::MissingConfig(path.to_path_buf()));
        }
        Self::load_from_file(path)
    }

    /// Load a single file. A missing file yields the default config.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, LauncherError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {:?} not found, skipping", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents).map_err(|source| LauncherError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Overlay `other` on top of this config, key by key.
    pub fn merge(&mut self, other: Config) {
        self.scrapyd.extend(other.scrapyd);
        if let Some(settings) = other.settings {
            self.settings
                .get_or_insert_with(toml::Table::new)
                .extend(settings);
        }
    }

    /// Set a `[scrapyd]` option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.scrapyd.insert(key.into(), value.into());
        self
    }

    /// Add a statically configured project to `[settings]`.
    pub fn with_project(mut self, project: impl Into<String>, module: impl Into<String>) -> Self {
        self.settings
            .get_or_insert_with(toml::Table::new)
            .insert(project.into(), toml::Value::String(module.into()));
        self
    }

    /// Look up a `[scrapyd]` option as text. Scalars are rendered, tables and arrays are not.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.scrapyd.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            toml::Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Look up a `[scrapyd]` option, falling back to `default`.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Look up an integer `[scrapyd]` option, falling back to `default`.
    pub fn get_u64(&self, key: &str, default: u64) -> Result<u64, LauncherError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                LauncherError::InvalidConfig(format!(
                    "{key}={raw} is not a non-negative integer"
                ))
            }),
        }
    }

    /// Directory holding queue files, relative to the run directory.
    pub fn dbs_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("dbs_dir", DEFAULT_DBS_DIR))
    }

    /// Directory of deployed project packages, relative to the run directory.
    pub fn eggs_dir(&self) -> PathBuf {
        PathBuf::from(self.get_or("eggs_dir", DEFAULT_EGGS_DIR))
    }

    /// Module run with `-m` to list and crawl spiders.
    pub fn runner(&self) -> String {
        self.get_or("runner", DEFAULT_RUNNER)
    }

    /// Interpreter used to launch the runner.
    pub fn python(&self) -> String {
        self.get_or("python", DEFAULT_PYTHON)
    }

    /// Upper bound on a spider listing.
    pub fn list_timeout(&self) -> Result<Duration, LauncherError> {
        Ok(Duration::from_secs(
            self.get_u64("list_timeout", DEFAULT_LIST_TIMEOUT_SECS)?,
        ))
    }

    pub fn queue_backend(&self) -> Result<QueueBackend, LauncherError> {
        match self.get("queue_backend") {
            None => Ok(QueueBackend::default()),
            Some(name) => Ok(name.parse()?),
        }
    }

    /// Keys of the `[settings]` table, empty when the table is absent.
    pub fn settings_keys(&self) -> Vec<String> {
        self.settings
            .as_ref()
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/scrapyd/scrapyd.toml")];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".scrapyd.toml"));
    }
    paths.push(PathBuf::from("scrapyd.toml"));
    paths
}
