use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong loading a [`crate::SharqConfig`].
///
/// One variant per failure site, each carrying enough context (path,
/// source error) to print a useful message without the caller needing to
/// reconstruct it.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    FileParse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid redis url: {source}")]
    InvalidRedisUrl {
        #[source]
        source: url::ParseError,
    },

    #[error("invalid requeue limit: {0}")]
    InvalidRequeueLimit(#[from] sharq_model::RequeueLimitError),

    #[error("`job_expire_interval_ms` must be greater than zero")]
    InvalidJobExpireInterval,

    #[error("`redis.pool_size` must be greater than zero")]
    InvalidPoolSize,

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}
