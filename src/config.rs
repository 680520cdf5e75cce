//! Configuration for the default background worker pool.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: a [`PoolConfig`] passed to
//!    [`init_default_pool`](crate::executor::init_default_pool)
//! 2. **Environment variables**: values from `PLEDGE_*` env vars
//! 3. **Config file**: a TOML file (requires the `config-file` feature)
//! 4. **Defaults**: [`PoolConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `PLEDGE_POOL_MIN_THREADS` | `usize` | `min_threads` |
//! | `PLEDGE_POOL_MAX_THREADS` | `usize` | `max_threads` |
//! | `PLEDGE_POOL_IDLE_TIMEOUT_MS` | `u64` | `idle_timeout` |
//! | `PLEDGE_POOL_THREAD_NAME_PREFIX` | `String` | `thread_name_prefix` |

use crate::error::ConfigError;
use std::time::Duration;

/// Environment variable name for the pool's minimum thread count.
pub const ENV_POOL_MIN_THREADS: &str = "PLEDGE_POOL_MIN_THREADS";
/// Environment variable name for the pool's maximum thread count.
pub const ENV_POOL_MAX_THREADS: &str = "PLEDGE_POOL_MAX_THREADS";
/// Environment variable name for the idle retirement timeout, in milliseconds.
pub const ENV_POOL_IDLE_TIMEOUT_MS: &str = "PLEDGE_POOL_IDLE_TIMEOUT_MS";
/// Environment variable name for the worker thread name prefix.
pub const ENV_POOL_THREAD_NAME_PREFIX: &str = "PLEDGE_POOL_THREAD_NAME_PREFIX";

/// Default idle timeout before retiring excess threads.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Threads kept alive even when idle.
    pub min_threads: usize,
    /// Upper bound on worker threads.
    pub max_threads: usize,
    /// Idle time after which threads above `min_threads` retire.
    pub idle_timeout: Duration,
    /// Worker thread name prefix.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism().map_or(4, usize::from);
        Self {
            min_threads: 1,
            max_threads: parallelism,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            thread_name_prefix: "pledge".to_string(),
        }
    }
}

impl PoolConfig {
    /// Normalize configuration values to safe defaults.
    pub fn normalize(&mut self) {
        if self.max_threads == 0 {
            self.max_threads = 1;
        }
        if self.max_threads < self.min_threads {
            self.max_threads = self.min_threads;
        }
        if self.thread_name_prefix.is_empty() {
            self.thread_name_prefix = "pledge".to_string();
        }
    }

    /// Defaults with environment overrides applied, normalized.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        config.normalize();
        Ok(config)
    }
}

/// Apply environment variable overrides to a [`PoolConfig`].
///
/// Only variables that are set in the environment are applied.
/// Returns an error if a variable is set but contains an unparseable value.
pub fn apply_env_overrides(config: &mut PoolConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_POOL_MIN_THREADS) {
        config.min_threads = parse_usize(ENV_POOL_MIN_THREADS, &val)?;
    }
    if let Some(val) = read_env(ENV_POOL_MAX_THREADS) {
        config.max_threads = parse_usize(ENV_POOL_MAX_THREADS, &val)?;
    }
    if let Some(val) = read_env(ENV_POOL_IDLE_TIMEOUT_MS) {
        config.idle_timeout = Duration::from_millis(parse_u64(ENV_POOL_IDLE_TIMEOUT_MS, &val)?);
    }
    if let Some(val) = read_env(ENV_POOL_THREAD_NAME_PREFIX) {
        config.thread_name_prefix = val;
    }
    Ok(())
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
        var,
        expected: "unsigned integer",
        value: val.to_string(),
    })
}

fn parse_u64(var: &'static str, val: &str) -> Result<u64, ConfigError> {
    val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
        var,
        expected: "milliseconds as u64",
        value: val.to_string(),
    })
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable pool configuration.
///
/// ```toml
/// [pool]
/// min_threads = 1
/// max_threads = 8
/// idle_timeout_ms = 10000
/// thread_name_prefix = "myapp"
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct PledgeTomlConfig {
    /// Pool settings.
    #[serde(default)]
    pub pool: PoolToml,
}

/// Pool section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct PoolToml {
    /// Minimum number of worker threads.
    pub min_threads: Option<usize>,
    /// Maximum number of worker threads.
    pub max_threads: Option<usize>,
    /// Idle retirement timeout in milliseconds.
    pub idle_timeout_ms: Option<u64>,
    /// Worker thread name prefix.
    pub thread_name_prefix: Option<String>,
}

/// Apply a parsed TOML config to a [`PoolConfig`].
///
/// Only fields that are `Some` in the TOML struct override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut PoolConfig, toml: &PledgeTomlConfig) {
    if let Some(v) = toml.pool.min_threads {
        config.min_threads = v;
    }
    if let Some(v) = toml.pool.max_threads {
        config.max_threads = v;
    }
    if let Some(v) = toml.pool.idle_timeout_ms {
        config.idle_timeout = Duration::from_millis(v);
    }
    if let Some(ref v) = toml.pool.thread_name_prefix {
        config.thread_name_prefix.clone_from(v);
    }
}

/// Parse a TOML string into a [`PledgeTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<PledgeTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read and parse a TOML file into a [`PledgeTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<PledgeTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_toml_str(&content)
}

#[cfg(feature = "config-file")]
impl PoolConfig {
    /// Defaults, then the TOML file at `path`, then environment overrides,
    /// normalized.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_toml_config(&mut config, &parse_toml_file(path)?);
        apply_env_overrides(&mut config)?;
        config.normalize();
        Ok(config)
    }
}
