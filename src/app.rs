//! Application wiring for the generation and metadata operations.

use crate::ai::replicate::{ModelRef, ReplicateHttpClient};
use crate::ai::{
    ImageGenerationService, ReplicateImageClient, ReplicateTextClient, TextGenerationService,
};
use crate::models::{
    Config, Envelope, GeneratedTextResult, Metadata, PhotoResult, PromptInput, RepositoryBackend,
    StorageBackend, StoredMetadata,
};
use crate::orchestrator::photo::PHOTO_KEY_PREFIX;
use crate::orchestrator::{PhotoGenerationOrchestrator, TextGenerationOrchestrator};
use crate::repository::{FirestoreRepository, InMemoryMetadataRepository, MetadataRepository};
use crate::storage::{BlobStorage, LocalBlobStorage, S3BlobStorage};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Owns the orchestrators and the repository. Built once at startup and
/// shared read-only between requests.
pub struct App {
    text: TextGenerationOrchestrator,
    photo: PhotoGenerationOrchestrator,
    repository: Arc<dyn MetadataRepository>,
    photo_dir: Option<PathBuf>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text_gen: Arc<dyn TextGenerationService>,
    pub image_gen: Arc<dyn ImageGenerationService>,
    pub storage: Arc<dyn BlobStorage>,
    pub repository: Arc<dyn MetadataRepository>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, generation_timeout: Option<Duration>) -> Self {
        let mut text = TextGenerationOrchestrator::new(services.text_gen);
        let mut photo = PhotoGenerationOrchestrator::new(services.image_gen, services.storage);
        if let Some(timeout) = generation_timeout {
            text = text.with_timeout(timeout);
            photo = photo.with_timeout(timeout);
        }

        Self {
            text,
            photo,
            repository: services.repository,
            photo_dir: None,
        }
    }

    /// Directory of locally stored photos to expose over HTTP.
    pub fn with_photo_dir(mut self, photo_dir: PathBuf) -> Self {
        self.photo_dir = Some(photo_dir);
        self
    }

    pub fn photo_dir(&self) -> Option<&Path> {
        self.photo_dir.as_deref()
    }

    /// Construct an app from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let replicate = ReplicateHttpClient::new_with_client(
            config.replicate_api_token.clone(),
            http_client.clone(),
        )
        .with_base_url(config.replicate_base_url.clone());

        let text_model: ModelRef = config.text_model.parse()?;
        let image_model: ModelRef = config.image_model.parse()?;
        info!("Text model: {}", text_model);
        info!("Image model: {}", image_model);

        let text_gen = Arc::new(ReplicateTextClient::new(replicate.clone(), text_model));
        let image_gen = Arc::new(ReplicateImageClient::new(replicate, image_model));

        let mut photo_dir = None;
        let storage: Arc<dyn BlobStorage> = match config.storage_backend {
            StorageBackend::Local => {
                let served_dir = config.photo_dir.join(PHOTO_KEY_PREFIX);
                tokio::fs::create_dir_all(&served_dir).await?;
                info!("Storing photos locally in {}", served_dir.display());
                photo_dir = Some(served_dir);
                Arc::new(LocalBlobStorage::new(
                    config.photo_dir.clone(),
                    config.public_base_url(),
                ))
            }
            StorageBackend::S3 => {
                info!(
                    "Storing photos in bucket {} at {}",
                    config.s3_bucket, config.s3_endpoint
                );
                Arc::new(
                    S3BlobStorage::new(
                        required(&config.s3_access_key_id, "S3_ACCESS_KEY_ID")?,
                        required(&config.s3_secret_access_key, "S3_SECRET_ACCESS_KEY")?,
                        config.s3_endpoint.clone(),
                        config.s3_bucket.clone(),
                        config.s3_public_base_url.clone(),
                    )
                    .await?,
                )
            }
        };

        let repository: Arc<dyn MetadataRepository> = match config.repository_backend {
            RepositoryBackend::Firestore => {
                info!(
                    "Metadata repository: Firestore collection {}",
                    config.firestore_collection
                );
                Arc::new(
                    FirestoreRepository::new_with_client(
                        required(&config.firestore_project_id, "FIRESTORE_PROJECT_ID")?,
                        required(&config.firestore_access_token, "FIRESTORE_ACCESS_TOKEN")?,
                        config.firestore_collection.clone(),
                        http_client,
                    )
                    .with_base_url(config.firestore_base_url.clone()),
                )
            }
            RepositoryBackend::Memory => {
                warn!("Metadata repository: in-memory, records are lost on restart");
                Arc::new(InMemoryMetadataRepository::new())
            }
        };

        let app = Self::with_services(
            AppServices {
                text_gen,
                image_gen,
                storage,
                repository,
            },
            Some(config.generation_timeout),
        );

        Ok(match photo_dir {
            Some(dir) => app.with_photo_dir(dir),
            None => app,
        })
    }

    /// Generation errors are returned as data, not propagated.
    pub async fn generate_text(&self, input: &PromptInput) -> Envelope<GeneratedTextResult> {
        let result = self.text.generate(input).await;
        if let Err(e) = &result {
            warn!("Text generation failed: {}", e);
        }
        Envelope::from_result(result)
    }

    /// Generation errors are returned as data, not propagated.
    pub async fn generate_photo(&self, input: &PromptInput) -> Envelope<PhotoResult> {
        let result = self.photo.generate(input).await;
        if let Err(e) = &result {
            warn!("Photo generation failed: {}", e);
        }
        Envelope::from_result(result)
    }

    pub async fn store_metadata(&self, metadata: &Metadata) -> Result<String> {
        self.repository.store(metadata).await
    }

    pub async fn fetch_latest_metadata(&self) -> Result<StoredMetadata> {
        self.repository.fetch_latest().await
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| Error::Config(format!("{} not set", name)))
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices};
    use crate::ai::{MockImageGenerationClient, MockTextGenerationClient};
    use crate::models::{Config, Envelope, ErrorKind, Metadata, PromptInput};
    use crate::repository::InMemoryMetadataRepository;
    use crate::storage::MockBlobStorage;
    use crate::Error;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn build_test_app(
        text_gen: MockTextGenerationClient,
        image_gen: MockImageGenerationClient,
    ) -> App {
        App::with_services(
            AppServices {
                text_gen: Arc::new(text_gen),
                image_gen: Arc::new(image_gen),
                storage: Arc::new(
                    MockBlobStorage::new().with_base_url("https://cdn.test".to_string()),
                ),
                repository: Arc::new(InMemoryMetadataRepository::new()),
            },
            None,
        )
    }

    fn input() -> PromptInput {
        PromptInput {
            name: "Pixies".to_string(),
            band: "loud quiet loud".to_string(),
            year: 1988,
        }
    }

    #[tokio::test]
    async fn test_generate_text_error_becomes_envelope() {
        let app = build_test_app(
            MockTextGenerationClient::new().with_rejection("model unavailable"),
            MockImageGenerationClient::new(),
        );

        match app.generate_text(&input()).await {
            Envelope::Error(payload) => {
                assert_eq!(payload.kind, ErrorKind::UpstreamGeneration);
                assert!(payload.message.contains("model unavailable"));
            }
            Envelope::Data(data) => panic!("expected error envelope, got {:?}", data),
        }
    }

    #[tokio::test]
    async fn test_generate_photo_success_envelope() {
        let app = build_test_app(
            MockTextGenerationClient::new(),
            MockImageGenerationClient::new(),
        );

        match app.generate_photo(&input()).await {
            Envelope::Data(photo) => {
                assert!(photo.photo_reference.starts_with("https://cdn.test/photos/"))
            }
            Envelope::Error(payload) => panic!("unexpected error: {:?}", payload),
        }
    }

    #[tokio::test]
    async fn test_store_and_fetch_latest() {
        let app = build_test_app(
            MockTextGenerationClient::new().with_chunks(&["Surfer Rosa 1988"]),
            MockImageGenerationClient::new(),
        );

        assert!(matches!(
            app.fetch_latest_metadata().await,
            Err(Error::NotFound(_))
        ));

        let prompt = input();
        let text = match app.generate_text(&prompt).await {
            Envelope::Data(text) => text,
            Envelope::Error(e) => panic!("{:?}", e),
        };
        let photo = match app.generate_photo(&prompt).await {
            Envelope::Data(photo) => photo,
            Envelope::Error(e) => panic!("{:?}", e),
        };
        let metadata = Metadata::from_parts(&prompt, &text, &photo);

        let id = app.store_metadata(&metadata).await.unwrap();
        let latest = app.fetch_latest_metadata().await.unwrap();

        assert_eq!(latest.id, id);
        assert_eq!(latest.metadata, metadata);
        assert_eq!(latest.metadata.words_followed_by_numbers_count, 1);
    }

    #[tokio::test]
    async fn test_new_with_local_storage_and_memory_repository() {
        let dir = tempdir().unwrap();
        let photo_dir = dir.path().join("output").to_string_lossy().to_string();
        let vars: HashMap<&str, String> = HashMap::from([
            ("REPLICATE_API_TOKEN", "r8_test".to_string()),
            ("REPOSITORY_BACKEND", "memory".to_string()),
            ("PHOTO_DIR", photo_dir),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let app = App::new(&config).await.unwrap();

        let served = app.photo_dir().unwrap();
        assert!(served.ends_with("photos"));
        assert!(served.is_dir());
    }

    #[tokio::test]
    async fn test_new_rejects_malformed_model() {
        let vars: HashMap<&str, String> = HashMap::from([
            ("REPLICATE_API_TOKEN", "r8_test".to_string()),
            ("REPOSITORY_BACKEND", "memory".to_string()),
            ("TEXT_MODEL", "not-a-model".to_string()),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        assert!(matches!(App::new(&config).await, Err(Error::Config(_))));
    }
}
