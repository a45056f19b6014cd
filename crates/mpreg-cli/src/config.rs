//! Application configuration.

use crate::error::{AppError, AppResult};
use mpreg_core::{parse_address, Address, LogicHandle};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MPREG_CONFIG";

/// Config file used when neither `--config` nor `MPREG_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// A deployed logic module the operator can point the gateway at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Operator-facing name (`v1`, `v2`, ...).
    pub name: String,
    /// Deployment address, `0x` + 40 hex chars.
    pub address: String,
}

impl DeploymentConfig {
    pub fn handle(&self) -> AppResult<LogicHandle> {
        let address = parse_address(&self.address)
            .map_err(|e| AppError::Config(format!("deployment {}: {e}", self.name)))?;
        Ok(LogicHandle::new(address))
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default log filter (`RUST_LOG` takes precedence).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway snapshot file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Directory for daily audit logs.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,

    /// Events buffered before the audit log is flushed.
    #[serde(default = "default_audit_buffer_size")]
    pub audit_buffer_size: usize,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Known logic deployments.
    #[serde(default = "default_deployments")]
    pub deployments: Vec<DeploymentConfig>,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./data/registry.json")
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from("./data/audit")
}

fn default_audit_buffer_size() -> usize {
    1
}

fn default_deployments() -> Vec<DeploymentConfig> {
    vec![
        DeploymentConfig {
            name: "v1".to_string(),
            address: "0x1000000000000000000000000000000000000001".to_string(),
        },
        DeploymentConfig {
            name: "v2".to_string(),
            address: "0x2000000000000000000000000000000000000002".to_string(),
        },
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            audit_dir: default_audit_dir(),
            audit_buffer_size: default_audit_buffer_size(),
            telemetry: TelemetryConfig::default(),
            deployments: default_deployments(),
        }
    }
}

impl AppConfig {
    /// Resolve the config path: explicit path > `MPREG_CONFIG` > default.
    pub fn resolve_path(explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path`, falling back to defaults if the file is missing.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Deployment names and addresses must be unique and addresses non-null.
    pub fn validate(&self) -> AppResult<()> {
        let mut names = HashSet::new();
        let mut addresses: HashSet<Address> = HashSet::new();
        for deployment in &self.deployments {
            if !names.insert(deployment.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate deployment name {}",
                    deployment.name
                )));
            }
            let handle = deployment.handle()?;
            if handle.is_null() {
                return Err(AppError::Config(format!(
                    "deployment {} has a null address",
                    deployment.name
                )));
            }
            if !addresses.insert(handle.address()) {
                return Err(AppError::Config(format!(
                    "deployment {} reuses address {}",
                    deployment.name, handle
                )));
            }
        }
        if self.audit_buffer_size == 0 {
            return Err(AppError::Config("audit_buffer_size must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn deployment(&self, name: &str) -> Option<&DeploymentConfig> {
        self.deployments.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.state_file, PathBuf::from("./data/registry.json"));
        assert_eq!(config.audit_buffer_size, 1);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.deployment("v1").is_some());
        assert!(config.deployment("v2").is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            state_file = "/tmp/mpreg/state.json"

            [telemetry]
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.state_file, PathBuf::from("/tmp/mpreg/state.json"));
        assert_eq!(config.audit_dir, PathBuf::from("./data/audit"));
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.deployments.len(), 2);
    }

    #[test]
    fn test_duplicate_deployment_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [[deployments]]
            name = "v1"
            address = "0x1000000000000000000000000000000000000001"

            [[deployments]]
            name = "v1"
            address = "0x2000000000000000000000000000000000000002"
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_null_deployment_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [[deployments]]
            name = "zero"
            address = "0x0000000000000000000000000000000000000000"
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        assert_eq!(AppConfig::resolve_path(Some("custom.toml")), "custom.toml");
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("state_file"));
        assert!(toml_str.contains("[[deployments]]"));
    }
}
