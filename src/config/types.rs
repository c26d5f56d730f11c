//! Configuration types.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{GraphError, GraphResult};
use crate::graph::ExternalEdgePolicy;
use crate::types::DependencyType;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 31995;

/// Largest lag magnitude accepted unless configured otherwise.
pub const DEFAULT_MAX_LAG_DAYS: i32 = 365;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dependencies: DependenciesConfig,

    #[serde(default)]
    pub gantt: GanttConfig,
}

/// HTTP server and storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-deps/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Edge defaults and validation bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependenciesConfig {
    /// Type used when a create request names none.
    #[serde(default)]
    pub default_type: DependencyType,

    /// Lag must fall in `[-max_lag_days, max_lag_days]`.
    #[serde(default = "default_max_lag_days")]
    pub max_lag_days: i32,
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            default_type: DependencyType::default(),
            max_lag_days: DEFAULT_MAX_LAG_DAYS,
        }
    }
}

fn default_max_lag_days() -> i32 {
    DEFAULT_MAX_LAG_DAYS
}

impl DependenciesConfig {
    /// Reject a lag outside the configured bound.
    pub fn check_lag(&self, lag: i32) -> GraphResult<()> {
        if lag < -self.max_lag_days || lag > self.max_lag_days {
            return Err(GraphError::invalid_value(
                "lag",
                format!(
                    "Lag must be between -{} and {} days, got {}",
                    self.max_lag_days, self.max_lag_days, lag
                ),
            ));
        }
        Ok(())
    }
}

/// Gantt view settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GanttConfig {
    #[serde(default)]
    pub external_edges: ExternalEdgePolicy,
}

impl Config {
    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.dependencies.max_lag_days < 0 {
            bail!(
                "dependencies.max_lag_days must not be negative (got {})",
                self.dependencies.max_lag_days
            );
        }
        if self.server.request_timeout_ms == 0 {
            bail!("server.request_timeout_ms must be greater than zero");
        }
        if self.server.host.trim().is_empty() {
            bail!("server.host must not be empty");
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 31995);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.db_path, PathBuf::from("task-deps/tasks.db"));
        assert_eq!(config.dependencies.max_lag_days, 365);
        assert_eq!(config.dependencies.default_type, DependencyType::FinishToStart);
        assert_eq!(config.gantt.external_edges, ExternalEdgePolicy::Redact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str(
            "dependencies:\n  default_type: start_to_start\ngantt:\n  external_edges: omit\n",
        )
        .unwrap();
        assert_eq!(config.dependencies.default_type, DependencyType::StartToStart);
        assert_eq!(config.dependencies.max_lag_days, 365);
        assert_eq!(config.gantt.external_edges, ExternalEdgePolicy::Omit);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn lag_bound_is_inclusive() {
        let deps = DependenciesConfig::default();
        assert!(deps.check_lag(365).is_ok());
        assert!(deps.check_lag(-365).is_ok());
        assert!(deps.check_lag(0).is_ok());

        let err = deps.check_lag(366).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("lag"));
        assert!(deps.check_lag(-366).is_err());
    }

    #[test]
    fn validate_rejects_bad_bounds() {
        let mut config = Config::default();
        config.dependencies.max_lag_days = -1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
