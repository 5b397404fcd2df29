use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::DbError;

pub const ENV_PREFIX: &str = "NEXUS_REST_";
pub const CONFIG_FILE_NAME: &str = "nexus-rest.toml";

/// Settings for the `nexus-rest` binary. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub schema_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    /// log4rs YAML file; takes over from `log_dir`/`log_level` when set.
    pub log_config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_retention: Option<u32>,
    pub default_collection: Option<String>,
}

impl AppConfig {
    /// # Errors
    /// Returns an error if the text is not valid TOML for this layout.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str(s)?)
    }

    /// Fill keys still unset from `other`.
    pub fn merge_missing(&mut self, other: Self) {
        if self.schema_path.is_none() {
            self.schema_path = other.schema_path;
        }
        if self.data_path.is_none() {
            self.data_path = other.data_path;
        }
        if self.log_dir.is_none() {
            self.log_dir = other.log_dir;
        }
        if self.log_config.is_none() {
            self.log_config = other.log_config;
        }
        if self.log_level.is_none() {
            self.log_level = other.log_level;
        }
        if self.log_retention.is_none() {
            self.log_retention = other.log_retention;
        }
        if self.default_collection.is_none() {
            self.default_collection = other.default_collection;
        }
    }

    /// Keys read from `NEXUS_REST_*` variables through `lookup`.
    pub fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).filter(|v| !v.trim().is_empty());
        Self {
            schema_path: var("SCHEMA").map(PathBuf::from),
            data_path: var("DATA").map(PathBuf::from),
            log_dir: var("LOG_DIR").map(PathBuf::from),
            log_config: var("LOG_CONFIG").map(PathBuf::from),
            log_level: var("LOG_LEVEL"),
            log_retention: var("LOG_RETENTION").and_then(|s| s.trim().parse().ok()),
            default_collection: var("DEFAULT_COLLECTION"),
        }
    }

    /// Merge config files in order, then the environment. Earlier sources win; missing files
    /// are skipped.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load<F>(paths: &[PathBuf], lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        for p in paths {
            if !p.exists() {
                continue;
            }
            let text = std::fs::read_to_string(p)?;
            let file_cfg = Self::from_toml_str(&text)?;
            log::debug!("config loaded from {}", p.display());
            cfg.merge_missing(file_cfg);
        }
        cfg.merge_missing(Self::from_env(lookup));
        Ok(cfg)
    }
}

/// Config file candidates: an explicit path, `NEXUS_REST_CONFIG`, the home directory, then the
/// working directory.
pub fn find_config_paths<F>(explicit: Option<&Path>, lookup: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut paths: Vec<PathBuf> = vec![];
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Some(p) = lookup(&format!("{ENV_PREFIX}CONFIG")) {
        paths.push(PathBuf::from(p));
    }
    if let Some(home) = lookup("USERPROFILE").or_else(|| lookup("HOME")) {
        let home = PathBuf::from(home);
        paths.push(home.join(".config").join(CONFIG_FILE_NAME));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join(CONFIG_FILE_NAME));
    }
    paths
}
