//! Configuration loading for the SharQ queueing engine.
//!
//! Loads a `[sharq]` / `[redis]` TOML file the same shape the original
//! `configparser`-based config used, overlaid by `SHARQ_*` environment
//! variables the way a config loader layered on top of a base TOML file
//! usually does. Invalid values are rejected here, at load time, not
//! deferred to the first engine call.

pub mod error;

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sharq_model::{EngineConfig, RequeueLimit};

pub use error::ConfigLoadError;

const ENV_PREFIX: &str = "SHARQ_";

/// The fully loaded, validated SharQ configuration.
#[derive(Debug, Clone)]
pub struct SharqConfig {
    pub engine: EngineConfig,
    pub redis: RedisConfig,
}

/// Connection parameters for the reference `sharq-redis` backend.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub pool_size: u32,
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            pool_size: 16,
            connect_timeout: Duration::from_millis(2_000),
        }
    }
}

impl Default for SharqConfig {
    fn default() -> Self {
        Self { engine: EngineConfig::default(), redis: RedisConfig::default() }
    }
}

/// Raw `[sharq]` / `[redis]` TOML shape, pre-validation. Every field is
/// optional so a partial file (or no file at all) still composes with
/// environment overrides and hardcoded defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    sharq: FileSharqSection,
    #[serde(default)]
    redis: FileRedisSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileSharqSection {
    key_prefix: Option<String>,
    job_expire_interval_ms: Option<i64>,
    default_job_requeue_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileRedisSection {
    url: Option<String>,
    pool_size: Option<u32>,
    connect_timeout_ms: Option<u64>,
}

/// Environment overlay, gathered independent of whether a file was found.
/// `SHARQ_KEY_PREFIX`, `SHARQ_JOB_EXPIRE_INTERVAL_MS`,
/// `SHARQ_DEFAULT_JOB_REQUEUE_LIMIT`, `SHARQ_REDIS_URL`,
/// `SHARQ_REDIS_POOL_SIZE`, `SHARQ_REDIS_CONNECT_TIMEOUT_MS`.
#[derive(Debug, Clone, Default)]
struct EnvOverlay {
    key_prefix: Option<String>,
    job_expire_interval_ms: Option<i64>,
    default_job_requeue_limit: Option<i64>,
    redis_url: Option<String>,
    redis_pool_size: Option<u32>,
    redis_connect_timeout_ms: Option<u64>,
}

impl EnvOverlay {
    fn gather() -> Self {
        Self {
            key_prefix: env_var("KEY_PREFIX"),
            job_expire_interval_ms: env_parsed("JOB_EXPIRE_INTERVAL_MS"),
            default_job_requeue_limit: env_parsed("DEFAULT_JOB_REQUEUE_LIMIT"),
            redis_url: env_var("REDIS_URL"),
            redis_pool_size: env_parsed("REDIS_POOL_SIZE"),
            redis_connect_timeout_ms: env_parsed("REDIS_CONNECT_TIMEOUT_MS"),
        }
    }
}

fn env_var(suffix: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{suffix}")).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    env_var(suffix).and_then(|v| v.parse().ok())
}

impl SharqConfig {
    /// Load from `path` (TOML), overlaid by `SHARQ_*` environment
    /// variables, falling back to hardcoded defaults where neither source
    /// sets a field. Passing `None` skips the file entirely and loads from
    /// environment + defaults only.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let file = match path {
            Some(path) => Self::read_file(path)?,
            None => FileConfig::default(),
        };
        let env = EnvOverlay::gather();
        Self::compose(file, env)
    }

    /// Load from a TOML file only, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let file = Self::read_file(path)?;
        Self::compose(file, EnvOverlay::default())
    }

    /// Load from the environment only, ignoring any config file.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::compose(FileConfig::default(), EnvOverlay::gather())
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigLoadError::FileIo { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "loaded sharq config file");
        toml::from_str(&contents)
            .map_err(|source| ConfigLoadError::FileParse { path: path.to_path_buf(), source: Box::new(source) })
    }

    fn compose(file: FileConfig, env: EnvOverlay) -> Result<Self, ConfigLoadError> {
        let defaults = SharqConfig::default();

        let key_prefix = env
            .key_prefix
            .or(file.sharq.key_prefix)
            .unwrap_or(defaults.engine.key_prefix);

        let job_expire_interval_ms = env
            .job_expire_interval_ms
            .or(file.sharq.job_expire_interval_ms)
            .unwrap_or(defaults.engine.job_expire_interval_ms as i64);
        if job_expire_interval_ms <= 0 {
            return Err(ConfigLoadError::InvalidJobExpireInterval);
        }

        let default_job_requeue_limit = env
            .default_job_requeue_limit
            .or(file.sharq.default_job_requeue_limit)
            .unwrap_or(defaults.engine.default_job_requeue_limit.get());
        let default_job_requeue_limit = RequeueLimit::new(default_job_requeue_limit)?;

        let redis_url = env.redis_url.or(file.redis.url).unwrap_or(defaults.redis.url);
        url::Url::parse(&redis_url).map_err(|source| ConfigLoadError::InvalidRedisUrl { source })?;

        let pool_size = env.redis_pool_size.or(file.redis.pool_size).unwrap_or(defaults.redis.pool_size);
        if pool_size == 0 {
            return Err(ConfigLoadError::InvalidPoolSize);
        }

        let connect_timeout_ms = env
            .redis_connect_timeout_ms
            .or(file.redis.connect_timeout_ms)
            .unwrap_or(defaults.redis.connect_timeout.as_millis() as u64);

        tracing::info!(key_prefix = %key_prefix, job_expire_interval_ms, "sharq config composed");

        Ok(Self {
            engine: EngineConfig {
                key_prefix,
                job_expire_interval_ms: job_expire_interval_ms as u64,
                default_job_requeue_limit,
            },
            redis: RedisConfig {
                url: redis_url,
                pool_size,
                connect_timeout: Duration::from_millis(connect_timeout_ms),
            },
        })
    }
}

/// Load a `.env` file (if present) into the process environment before
/// gathering `SHARQ_*` overrides. A missing `.env` file is not an error;
/// a malformed one is.
pub fn load_dotenv() -> Result<(), ConfigLoadError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(_)) => Ok(()),
        Err(source) => Err(ConfigLoadError::DotenvError(source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], body: F) {
        for (k, v) in vars {
            // SAFETY: tests run with `cargo test` default single-threaded-per-fn
            // semantics for env; serialized below via a lock would be ideal, but
            // the crate's test suite doesn't run config tests concurrently.
            unsafe { env::set_var(k, v) };
        }
        body();
        for (k, _) in vars {
            unsafe { env::remove_var(k) };
        }
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let config = SharqConfig::from_env().unwrap();
        assert_eq!(config.engine.key_prefix, "sharq");
        assert_eq!(config.engine.job_expire_interval_ms, 1_000);
        assert!(config.engine.default_job_requeue_limit.is_unbounded());
        assert_eq!(config.redis.url, "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn file_values_are_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [sharq]
            key_prefix = "myapp"
            job_expire_interval_ms = 5000
            default_job_requeue_limit = 3

            [redis]
            url = "redis://example.invalid:6380/1"
            pool_size = 4
            connect_timeout_ms = 500
            "#
        )
        .unwrap();

        let config = SharqConfig::from_file(file.path()).unwrap();
        assert_eq!(config.engine.key_prefix, "myapp");
        assert_eq!(config.engine.job_expire_interval_ms, 5000);
        assert_eq!(config.engine.default_job_requeue_limit.get(), 3);
        assert_eq!(config.redis.url, "redis://example.invalid:6380/1");
        assert_eq!(config.redis.pool_size, 4);
        assert_eq!(config.redis.connect_timeout, Duration::from_millis(500));
    }

    #[test]
    fn env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"[sharq]
key_prefix = "from_file""#).unwrap();

        with_env(&[("SHARQ_KEY_PREFIX", "from_env")], || {
            let config = SharqConfig::from_file(file.path()).unwrap();
            // from_file ignores env by design; use load() to overlay both.
            assert_eq!(config.engine.key_prefix, "from_file");

            let config = SharqConfig::load(Some(file.path())).unwrap();
            assert_eq!(config.engine.key_prefix, "from_env");
        });
    }

    #[test]
    fn rejects_non_positive_job_expire_interval() {
        with_env(&[("SHARQ_JOB_EXPIRE_INTERVAL_MS", "0")], || {
            assert!(matches!(
                SharqConfig::from_env().unwrap_err(),
                ConfigLoadError::InvalidJobExpireInterval
            ));
        });
    }

    #[test]
    fn rejects_invalid_requeue_limit() {
        with_env(&[("SHARQ_DEFAULT_JOB_REQUEUE_LIMIT", "-5")], || {
            assert!(matches!(
                SharqConfig::from_env().unwrap_err(),
                ConfigLoadError::InvalidRequeueLimit(_)
            ));
        });
    }

    #[test]
    fn rejects_zero_pool_size() {
        with_env(&[("SHARQ_REDIS_POOL_SIZE", "0")], || {
            assert!(matches!(SharqConfig::from_env().unwrap_err(), ConfigLoadError::InvalidPoolSize));
        });
    }

    #[test]
    fn rejects_malformed_redis_url() {
        with_env(&[("SHARQ_REDIS_URL", "not a url")], || {
            assert!(matches!(
                SharqConfig::from_env().unwrap_err(),
                ConfigLoadError::InvalidRedisUrl { .. }
            ));
        });
    }
}
