//! Engine configuration file support.
//!
//! Configuration is read from a TOML file and may be overridden per process
//! through environment variables:
//!
//! | Variable | Setting |
//! |---|---|
//! | `GRAPHQL_PROXY_URL` | `backend.proxy_url` |
//! | `GRAPHQL_API_URL` | `backend.graphql_url` |
//! | `PLAN_ENGINE_MAX_CONCURRENCY` | `engine.max_concurrency` |
//! | `PLAN_ENGINE_FAULT_POLICY` | `engine.fault_policy` |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};
use crate::graphql::TimePeriod;
use crate::models::ProviderGroupId;
use crate::services::executor::FaultPolicy;
use crate::services::plan_executor::ExecutionOptions;

pub const ENV_PROXY_URL: &str = "GRAPHQL_PROXY_URL";
pub const ENV_GRAPHQL_URL: &str = "GRAPHQL_API_URL";
pub const ENV_MAX_CONCURRENCY: &str = "PLAN_ENGINE_MAX_CONCURRENCY";
pub const ENV_FAULT_POLICY: &str = "PLAN_ENGINE_FAULT_POLICY";

/// Upper bound accepted for `engine.max_concurrency`.
pub const MAX_CONCURRENCY_LIMIT: usize = 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub time_period: TimePeriodSettings,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub metadata: MetadataSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub fault_policy: FaultPolicy,
    #[serde(default = "default_true")]
    pub include_general_stats: bool,
    /// Request descriptive statistics alongside every distribution.
    #[serde(default)]
    pub include_statistics: bool,
    #[serde(default = "default_provider_group_ids")]
    pub provider_group_ids: Vec<i64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            fault_policy: FaultPolicy::default(),
            include_general_stats: true,
            include_statistics: false,
            provider_group_ids: default_provider_group_ids(),
        }
    }
}

/// Broad window used when a query's filters carry no date bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimePeriodSettings {
    #[serde(default = "default_start")]
    pub default_start: NaiveDate,
    #[serde(default = "default_end")]
    pub default_end: NaiveDate,
}

impl Default for TimePeriodSettings {
    fn default() -> Self {
        Self {
            default_start: default_start(),
            default_end: default_end(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub proxy_url: String,
    #[serde(default)]
    pub graphql_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            proxy_url: String::new(),
            graphql_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSettings {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    4
}

fn default_provider_group_ids() -> Vec<i64> {
    vec![1]
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN)
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("config/metric_catalog.toml")
}

impl FromStr for EngineConfig {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| {
            EngineError::configuration(format!("Failed to parse config file: {}", e))
        })
    }
}

impl EngineConfig {
    /// Load engine configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::configuration(format!("Failed to read config file: {}", e))
        })?;
        content.parse()
    }

    /// Load engine configuration from the default location.
    ///
    /// Searches for `plan_engine.toml` in the current directory, then
    /// `backend/`, then the parent directory.
    pub fn from_default_location() -> EngineResult<Self> {
        let search_paths = [
            PathBuf::from("plan_engine.toml"),
            PathBuf::from("backend/plan_engine.toml"),
            PathBuf::from("../plan_engine.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("Loading engine config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(EngineError::configuration(
            "No plan_engine.toml found in standard locations",
        ))
    }

    /// Apply environment overrides on top of the file settings.
    pub fn apply_env_overrides(mut self) -> EngineResult<Self> {
        if let Ok(url) = std::env::var(ENV_PROXY_URL) {
            self.backend.proxy_url = url;
        }
        if let Ok(url) = std::env::var(ENV_GRAPHQL_URL) {
            self.backend.graphql_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_MAX_CONCURRENCY) {
            self.engine.max_concurrency = raw.trim().parse().map_err(|_| {
                EngineError::configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_MAX_CONCURRENCY, raw
                ))
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_FAULT_POLICY) {
            self.engine.fault_policy = raw.parse().map_err(EngineError::configuration)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.engine.max_concurrency == 0 || self.engine.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(EngineError::configuration(format!(
                "engine.max_concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY_LIMIT, self.engine.max_concurrency
            )));
        }
        if self.engine.provider_group_ids.is_empty() {
            return Err(EngineError::configuration(
                "engine.provider_group_ids must not be empty",
            ));
        }
        if self.time_period.default_start > self.time_period.default_end {
            return Err(EngineError::configuration(format!(
                "time_period.default_start {} is after default_end {}",
                self.time_period.default_start, self.time_period.default_end
            )));
        }
        Ok(())
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            fault_policy: self.engine.fault_policy,
            include_general_stats: self.engine.include_general_stats,
            include_statistics: self.engine.include_statistics,
            provider_group_ids: self
                .engine
                .provider_group_ids
                .iter()
                .copied()
                .map(ProviderGroupId::new)
                .collect(),
            default_period: TimePeriod::new(
                self.time_period.default_start,
                self.time_period.default_end,
            ),
            reference_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: EngineConfig = "".parse().unwrap();
        assert_eq!(config.engine.max_concurrency, 4);
        assert_eq!(config.engine.fault_policy, FaultPolicy::Abort);
        assert!(config.engine.include_general_stats);
        assert_eq!(config.engine.provider_group_ids, vec![1]);
        assert_eq!(config.time_period.default_start.to_string(), "2022-01-01");
        assert_eq!(config.time_period.default_end.to_string(), "2024-12-31");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[engine]
max_concurrency = 8
fault_policy = "degrade"
include_statistics = true
provider_group_ids = [1, 4]

[time_period]
default_start = "2021-01-01"
default_end = "2021-12-31"

[backend]
proxy_url = "https://proxy.example/api"
graphql_url = "https://metrics.example/graphql"
timeout_secs = 10

[metadata]
catalog_path = "/etc/plan-engine/catalog.toml"
"#;
        let config: EngineConfig = toml.parse().unwrap();
        assert_eq!(config.engine.max_concurrency, 8);
        assert_eq!(config.engine.fault_policy, FaultPolicy::Degrade);
        assert_eq!(config.backend.timeout_secs, 10);

        let options = config.execution_options();
        assert_eq!(options.provider_group_ids.len(), 2);
        assert!(options.include_statistics);
        assert_eq!(options.default_period.end_date.to_string(), "2021-12-31");
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config: EngineConfig = "[engine]\nmax_concurrency = 0\n".parse().unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_concurrency() {
        let config: EngineConfig = "[engine]\nmax_concurrency = 1025\n".parse().unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("between 1 and 1024"));

        let config: EngineConfig = "[engine]\nmax_concurrency = 1024\n".parse().unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_period() {
        let toml = "[time_period]\ndefault_start = \"2025-01-01\"\ndefault_end = \"2024-01-01\"\n";
        let config: EngineConfig = toml.parse().unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fault_policy_rejected() {
        assert!("[engine]\nfault_policy = \"retry\"\n".parse::<EngineConfig>().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan_engine.toml");
        std::fs::write(&path, "[engine]\nmax_concurrency = 2\n").unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.engine.max_concurrency, 2);
        assert!(EngineConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
