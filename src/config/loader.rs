//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `task-deps/config.yaml` under the working directory.
    Project = 1,
    /// `~/.task-deps/config.yaml`.
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

/// Where each tier lives.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    /// A single file that replaces the project and user tiers.
    pub explicit_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover tier locations from the environment and the home directory.
    pub fn discover() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`discover`](Self::discover) but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let user_dir = lookup("TASK_DEPS_USER_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-deps")));

        let project_dir = lookup("TASK_DEPS_PROJECT_DIR")
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-deps")));

        Self {
            project_dir,
            user_dir,
            explicit_file: lookup("TASK_DEPS_CONFIG_PATH").map(PathBuf::from),
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
    /// Tiers that contributed, lowest priority first.
    applied: Vec<ConfigTier>,
}

impl ConfigLoader {
    /// Load from explicit paths, without environment overrides.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with(paths, |_| None)
    }

    /// Load from explicit paths, reading environment overrides through `lookup`.
    pub fn load_with(paths: ConfigPaths, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut applied = vec![ConfigTier::Defaults];
        let mut config_path = None;

        if let Some(ref explicit) = paths.explicit_file {
            // An explicit file must exist; a broken override should not fall back silently
            tiers.push(
                read_yaml(explicit)?
                    .with_context(|| format!("config file {} not found", explicit.display()))?,
            );
            config_path = Some(explicit.clone());
            // The explicit file stands in for the project tier
            applied.push(ConfigTier::Project);
        } else {
            for (tier, dir) in [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ] {
                let Some(dir) = dir else { continue };
                let file = dir.join("config.yaml");
                match read_yaml(&file) {
                    Ok(Some(value)) => {
                        debug!(%tier, path = %file.display(), "loaded config tier");
                        tiers.push(value);
                        applied.push(tier);
                        config_path = Some(file);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(%tier, path = %file.display(), "ignoring unreadable config: {e:#}"),
                }
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(tiers))?;
        if Self::apply_env_overrides(&mut config, &lookup)? {
            applied.push(ConfigTier::Environment);
        }

        Ok(Self {
            paths,
            config,
            config_path,
            applied,
        })
    }

    /// Returns whether any variable was set.
    fn apply_env_overrides(
        config: &mut Config,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<bool> {
        let mut overridden = false;

        if let Some(db_path) = lookup("TASK_DEPS_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
            overridden = true;
        }

        if let Some(port) = lookup("TASK_DEPS_PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("TASK_DEPS_PORT is not a valid port: {port}"))?;
            overridden = true;
        }

        Ok(overridden)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn applied_tiers(&self) -> &[ConfigTier] {
        &self.applied
    }
}

/// Read a YAML file as a JSON value. `Ok(None)` when the file is absent.
fn read_yaml(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(value))
}
