//! Data models and structures
//!
//! Defines the request/response shapes, the persisted metadata record, the
//! response envelope, and environment configuration.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Structured prompt supplied by the client for both generation operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptInput {
    pub name: String,
    /// Free text: why the user likes this band.
    pub band: String,
    pub year: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: PromptInput,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum YearParity {
    Odd,
    Even,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedTextResult {
    pub generated_text: String,
    pub capitalized_words_count: u64,
    pub words_followed_by_numbers_count: u64,
    pub year_parity: YearParity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PhotoResult {
    pub photo_reference: String,
}

/// A metadata record as submitted by the client. The timestamp is assigned by
/// the document store on write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub generated_text: String,
    pub photo_url: String,
    pub capitalized_words_count: u64,
    pub words_followed_by_numbers_count: u64,
    pub year_parity: YearParity,
    pub name: String,
    pub band: String,
    pub year: i64,
}

impl Metadata {
    /// Combine the results of the two independent generation calls.
    pub fn from_parts(prompt: &PromptInput, text: &GeneratedTextResult, photo: &PhotoResult) -> Self {
        Self {
            generated_text: text.generated_text.clone(),
            photo_url: photo.photo_reference.clone(),
            capitalized_words_count: text.capitalized_words_count,
            words_followed_by_numbers_count: text.words_followed_by_numbers_count,
            year_parity: text.year_parity,
            name: prompt.name.clone(),
            band: prompt.band.clone(),
            year: prompt.year,
        }
    }
}

/// A metadata record as read back from the document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UpstreamGeneration,
    StorageWrite,
    Persistence,
    NotFound,
    Timeout,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

/// Success/error wrapper returned by the generation endpoints inside a
/// successful HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Envelope<T> {
    Data(T),
    Error(ErrorPayload),
}

impl<T> Envelope<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Envelope::Data(data),
            Err(e) => Envelope::Error(ErrorPayload {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            other => Err(Error::Config(format!(
                "Unsupported STORAGE_BACKEND '{}'. Expected 'local' or 's3'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryBackend {
    Firestore,
    Memory,
}

impl FromStr for RepositoryBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(Error::Config(format!(
                "Unsupported REPOSITORY_BACKEND '{}'. Expected 'firestore' or 'memory'",
                other
            ))),
        }
    }
}

pub const DEFAULT_TEXT_MODEL: &str = "meta/llama-2-7b-chat";
pub const DEFAULT_IMAGE_MODEL: &str =
    "stability-ai/stable-diffusion:ac732df83cea7fff18b8472768c88ad041fa750ff7682a21affe81863cbe77e4";

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub replicate_api_token: String,
    pub replicate_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub generation_timeout: Duration,
    pub storage_backend: StorageBackend,
    pub photo_dir: PathBuf,
    /// `PUBLIC_BASE_URL` when set; otherwise local URLs follow `port`.
    pub public_base_url_override: Option<String>,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_public_base_url: String,
    pub repository_backend: RepositoryBackend,
    pub firestore_project_id: Option<String>,
    pub firestore_access_token: Option<String>,
    pub firestore_base_url: String,
    pub firestore_collection: String,
    pub port: u16,
}

impl Config {
    /// Base URL that locally stored photos are reachable under.
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url_override {
            Some(url) => url.clone(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Listen on `port` instead of the configured one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required =
            |key: &str| var(key).ok_or_else(|| Error::Config(format!("{} not set", key)));

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("Invalid PORT '{}'", raw)))?,
            None => 8000,
        };

        let generation_timeout = match var("GENERATION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("Invalid GENERATION_TIMEOUT_SECS '{}'", raw))
            })?),
            None => Duration::from_secs(300),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Local,
        };
        let repository_backend = match var("REPOSITORY_BACKEND") {
            Some(raw) => raw.parse()?,
            None => RepositoryBackend::Firestore,
        };

        let s3_access_key_id = var("S3_ACCESS_KEY_ID");
        let s3_secret_access_key = var("S3_SECRET_ACCESS_KEY");
        if storage_backend == StorageBackend::S3 {
            if s3_access_key_id.is_none() {
                return Err(Error::Config(
                    "S3_ACCESS_KEY_ID not set (required for STORAGE_BACKEND=s3)".to_string(),
                ));
            }
            if s3_secret_access_key.is_none() {
                return Err(Error::Config(
                    "S3_SECRET_ACCESS_KEY not set (required for STORAGE_BACKEND=s3)".to_string(),
                ));
            }
        }

        let firestore_project_id = var("FIRESTORE_PROJECT_ID");
        let firestore_access_token = var("FIRESTORE_ACCESS_TOKEN");
        if repository_backend == RepositoryBackend::Firestore {
            if firestore_project_id.is_none() {
                return Err(Error::Config(
                    "FIRESTORE_PROJECT_ID not set (required for REPOSITORY_BACKEND=firestore)"
                        .to_string(),
                ));
            }
            if firestore_access_token.is_none() {
                return Err(Error::Config(
                    "FIRESTORE_ACCESS_TOKEN not set (required for REPOSITORY_BACKEND=firestore)"
                        .to_string(),
                ));
            }
        }

        let s3_endpoint = var("S3_ENDPOINT")
            .unwrap_or_else(|| "https://s3.us-east-1.amazonaws.com".to_string());
        let s3_bucket = var("S3_BUCKET").unwrap_or_else(|| "band-spotlight".to_string());
        let s3_public_base_url = var("S3_PUBLIC_BASE_URL").unwrap_or_else(|| {
            format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)
        });

        Ok(Self {
            replicate_api_token: required("REPLICATE_API_TOKEN")?,
            replicate_base_url: var("REPLICATE_BASE_URL")
                .unwrap_or_else(|| "https://api.replicate.com".to_string()),
            text_model: var("TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: var("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            generation_timeout,
            storage_backend,
            photo_dir: PathBuf::from(var("PHOTO_DIR").unwrap_or_else(|| "output".to_string())),
            public_base_url_override: var("PUBLIC_BASE_URL"),
            s3_access_key_id,
            s3_secret_access_key,
            s3_endpoint,
            s3_bucket,
            s3_public_base_url,
            repository_backend,
            firestore_project_id,
            firestore_access_token,
            firestore_base_url: var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| "https://firestore.googleapis.com".to_string()),
            firestore_collection: var("FIRESTORE_COLLECTION")
                .unwrap_or_else(|| "generated_data".to_string()),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_year_parity_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&YearParity::Even).unwrap(), "\"Even\"");
        let parsed: YearParity = serde_json::from_str("\"Odd\"").unwrap();
        assert_eq!(parsed, YearParity::Odd);
    }

    #[test]
    fn test_envelope_data_shape() {
        let envelope: Envelope<PhotoResult> = Envelope::from_result(Ok(PhotoResult {
            photo_reference: "http://localhost/photos/a.png".to_string(),
        }));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "data": "http://localhost/photos/a.png" })
        );
    }

    #[test]
    fn test_envelope_error_shape() {
        let envelope: Envelope<PhotoResult> = Envelope::from_result(Err(
            Error::UpstreamGeneration("model rejected prompt".to_string()),
        ));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["kind"], "upstream_generation");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("model rejected prompt"));
    }

    #[test]
    fn test_stored_metadata_flattens_fields() {
        let stored = StoredMetadata {
            id: "abc".to_string(),
            timestamp: Utc::now(),
            metadata: Metadata {
                generated_text: "Text".to_string(),
                photo_url: "url".to_string(),
                capitalized_words_count: 1,
                words_followed_by_numbers_count: 0,
                year_parity: YearParity::Even,
                name: "Queen".to_string(),
                band: "Vocals".to_string(),
                year: 1980,
            },
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["name"], "Queen");
        assert_eq!(json["year_parity"], "Even");
    }

    #[test]
    fn test_config_defaults_with_memory_repository() {
        let config = Config::from_lookup(lookup_from(&[
            ("REPLICATE_API_TOKEN", "r8_test"),
            ("REPOSITORY_BACKEND", "memory"),
        ]))
        .unwrap();

        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.repository_backend, RepositoryBackend::Memory);
        assert_eq!(config.port, 8000);
        assert_eq!(config.public_base_url(), "http://localhost:8000");
        assert_eq!(config.firestore_collection, "generated_data");
        assert_eq!(config.generation_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_config_port_override_moves_local_photo_urls() {
        let config = Config::from_lookup(lookup_from(&[
            ("REPLICATE_API_TOKEN", "r8_test"),
            ("REPOSITORY_BACKEND", "memory"),
        ]))
        .unwrap()
        .with_port(9000);

        assert_eq!(config.port, 9000);
        assert_eq!(config.public_base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_config_port_override_keeps_explicit_public_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("REPLICATE_API_TOKEN", "r8_test"),
            ("REPOSITORY_BACKEND", "memory"),
            ("PORT", "7000"),
            ("PUBLIC_BASE_URL", "https://bands.example.com"),
        ]))
        .unwrap()
        .with_port(9000);

        assert_eq!(config.port, 9000);
        assert_eq!(config.public_base_url(), "https://bands.example.com");
    }

    #[test]
    fn test_config_requires_api_token() {
        let err = Config::from_lookup(lookup_from(&[("REPOSITORY_BACKEND", "memory")]))
            .unwrap_err();
        assert!(err.to_string().contains("REPLICATE_API_TOKEN"));
    }

    #[test]
    fn test_config_firestore_requires_project() {
        let err = Config::from_lookup(lookup_from(&[("REPLICATE_API_TOKEN", "t")])).unwrap_err();
        assert!(err.to_string().contains("FIRESTORE_PROJECT_ID"));
    }

    #[test]
    fn test_config_s3_requires_credentials() {
        let err = Config::from_lookup(lookup_from(&[
            ("REPLICATE_API_TOKEN", "t"),
            ("REPOSITORY_BACKEND", "memory"),
            ("STORAGE_BACKEND", "s3"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("S3_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_config_rejects_unknown_backend() {
        let err = Config::from_lookup(lookup_from(&[
            ("REPLICATE_API_TOKEN", "t"),
            ("REPOSITORY_BACKEND", "postgres"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
