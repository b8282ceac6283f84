use std::path::PathBuf;

use thiserror::Error;

use crate::app_error::AppError;

/// Errors that can occur while loading configuration and wiring stores at startup.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Could not read configuration file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file {path} is not valid JSON")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JWT scene configuration rejected")]
    Resolve(#[source] AppError),

    #[error("Redis connection failed. Check REDIS_URL and credentials.")]
    RedisConnection(#[source] redis::RedisError),
}

impl From<AppError> for InfraError {
    fn from(e: AppError) -> Self {
        InfraError::Resolve(e)
    }
}
