//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use crate::models::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Upstream generation error: {0}")]
    UpstreamGeneration(String),

    #[error("Storage write error: {0}")]
    StorageWrite(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl Error {
    /// Externally visible classification used in response envelopes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UpstreamGeneration(_) | Error::Http(_) => ErrorKind::UpstreamGeneration,
            Error::StorageWrite(_) => ErrorKind::StorageWrite,
            Error::Persistence(_) => ErrorKind::Persistence,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Io(_) | Error::Serialization(_) | Error::EnvVar(_) | Error::Config(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
