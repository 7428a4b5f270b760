//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "PROJECT_TRACKER_CONFIG_PATH";
pub const ENV_DB_PATH: &str = "PROJECT_TRACKER_DB_PATH";
pub const ENV_HOST: &str = "PROJECT_TRACKER_HOST";
pub const ENV_PORT: &str = "PROJECT_TRACKER_PORT";
pub const ENV_USER_DIR: &str = "PROJECT_TRACKER_USER_DIR";
pub const ENV_PROJECT_DIR: &str = "PROJECT_TRACKER_PROJECT_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `./project-tracker/`
    Project = 1,
    /// `~/.project-tracker/`
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".project-tracker")));

        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("project-tracker")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            ConfigTier::Defaults | ConfigTier::Environment => None,
        }?;
        Some(dir.join(CONFIG_FILE))
    }
}

/// Read one tier's YAML file. Missing files are normal; unreadable or
/// malformed ones are skipped with a warning.
fn read_tier(tier: ConfigTier, path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(%tier, path = %path.display(), error = %e, "Failed to read config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(%tier, path = %path.display(), "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(%tier, path = %path.display(), error = %e, "Ignoring malformed config file");
            None
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers. `explicit` (the `--config` flag)
    /// takes precedence over `PROJECT_TRACKER_CONFIG_PATH`.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let explicit = explicit.or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from));
        Self::load_with(ConfigPaths::discover(), explicit, |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, explicit: Option<PathBuf>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An explicit file replaces tier discovery.
        if let Some(path) = explicit {
            let mut config = Config::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            Self::apply_env_overrides(&mut config, &env);
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        for tier in [ConfigTier::Project, ConfigTier::User] {
            if let Some(file) = paths.config_file(tier)
                && let Some(value) = read_tier(tier, &file)
            {
                tiers.push(value);
                config_path = Some(file);
            }
        }

        let merged = deep_merge_all(tiers);
        let mut config: Config =
            serde_json::from_value(merged).context("invalid configuration")?;

        Self::apply_env_overrides(&mut config, &env);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides<F>(config: &mut Config, env: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = env(ENV_DB_PATH) {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = env(ENV_HOST) {
            config.server.host = host;
        }

        // Plain PORT is honored for hosting platforms that set it.
        if let Some(port) = env(ENV_PORT).or_else(|| env("PORT")) {
            match port.trim().parse::<u16>() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid port from environment"),
            }
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
