//! Startup configuration
//!
//! Environment:
//! - `CALL_MONITOR_ADDR`: listen address (default `127.0.0.1:8082`)
//! - `CALL_MONITOR_ACL`: JSON object mapping consumer -> list of patterns
//! - `CALL_MONITOR_ACL_FILE`: path to the same JSON (used when `CALL_MONITOR_ACL` is unset)
//! - `CALL_MONITOR_DELTA_CONSUMERS`: comma-separated, default `stat1`
//! - `CALL_MONITOR_CUMULATIVE_CONSUMERS`: comma-separated, default `stat2`
//! - `CALL_MONITOR_STATISTICS_AUTH`: `true` to reject unauthorized Statistics calls
//! - `CALL_MONITOR_LOG_LEVEL`: `EnvFilter` directive (default `info`)
//! - `CALL_MONITOR_LOG_FORMAT`: `json` or `pretty` (default `pretty`)
//!
//! ```bash
//! CALL_MONITOR_ACL='{"logger":["/main.Admin/Logging"],"biz_admin":["/main.Biz/*"]}' \
//!   call-monitor-server
//! ```

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::acl::AccessController;
use crate::service::ServiceOptions;
use crate::stats::StatPolicy;
use crate::telemetry::{LogConfig, LogError};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8082";

const ADDR_ENV: &str = "CALL_MONITOR_ADDR";
const ACL_ENV: &str = "CALL_MONITOR_ACL";
const ACL_FILE_ENV: &str = "CALL_MONITOR_ACL_FILE";
const DELTA_ENV: &str = "CALL_MONITOR_DELTA_CONSUMERS";
const CUMULATIVE_ENV: &str = "CALL_MONITOR_CUMULATIVE_CONSUMERS";
const STATISTICS_AUTH_ENV: &str = "CALL_MONITOR_STATISTICS_AUTH";
const LOG_LEVEL_ENV: &str = "CALL_MONITOR_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "CALL_MONITOR_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("access-control list not configured: set CALL_MONITOR_ACL or CALL_MONITOR_ACL_FILE")]
    MissingAcl,

    #[error("failed to read access-control file {}: {source}", .path.display())]
    ReadAcl {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse access-control list: {0}")]
    ParseAcl(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Log(#[from] LogError),
}

/// Everything needed to start the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub acl: AccessController,
    pub options: ServiceOptions,
    pub log: LogConfig,
}

impl ServiceConfig {
    pub fn new(listen_addr: impl Into<String>, acl: AccessController) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            acl,
            options: ServiceOptions::default(),
            log: LogConfig::default(),
        }
    }

    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup(ADDR_ENV).unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let acl_json = match (lookup(ACL_ENV), lookup(ACL_FILE_ENV)) {
            (Some(json), _) => json,
            (None, Some(path)) => {
                let path = PathBuf::from(path);
                fs::read_to_string(&path).map_err(|source| ConfigError::ReadAcl { path, source })?
            }
            (None, None) => return Err(ConfigError::MissingAcl),
        };
        let acl = AccessController::from_json(&acl_json)?;

        let stat_policy = StatPolicy::from_lists(
            list(lookup(DELTA_ENV), "stat1"),
            list(lookup(CUMULATIVE_ENV), "stat2"),
        );

        let statistics_requires_auth = match lookup(STATISTICS_AUTH_ENV) {
            None => false,
            Some(value) => value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                key: STATISTICS_AUTH_ENV,
                value,
            })?,
        };

        let mut log = LogConfig::default();
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            log.level = level;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            log.format = format.parse()?;
        }

        Ok(Self {
            listen_addr,
            acl,
            options: ServiceOptions {
                stat_policy,
                statistics_requires_auth,
                ..ServiceOptions::default()
            },
            log,
        })
    }
}

/// Split a comma-separated list, falling back to `default` when unset
fn list(value: Option<String>, default: &str) -> Vec<String> {
    value
        .as_deref()
        .unwrap_or(default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
