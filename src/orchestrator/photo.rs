use crate::ai::mime::detect_image_format;
use crate::ai::{ImageGenerationRequest, ImageGenerationService, Scheduler};
use crate::models::{PhotoResult, PromptInput};
use crate::storage::BlobStorage;
use crate::{prompts, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Storage key prefix for generated photos.
pub const PHOTO_KEY_PREFIX: &str = "photos";
pub const SCHEDULER: Scheduler = Scheduler::KEuler;

pub struct PhotoGenerationOrchestrator {
    service: Arc<dyn ImageGenerationService>,
    storage: Arc<dyn BlobStorage>,
    timeout: Option<Duration>,
}

impl PhotoGenerationOrchestrator {
    pub fn new(service: Arc<dyn ImageGenerationService>, storage: Arc<dyn BlobStorage>) -> Self {
        Self {
            service,
            storage,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Generate photos for `input`, store every asset, and reference the
    /// first.
    ///
    /// Keys carry a per-call random token so concurrent requests never
    /// overwrite each other's assets.
    pub async fn generate(&self, input: &PromptInput) -> Result<PhotoResult> {
        let request = ImageGenerationRequest {
            prompt: prompts::band_photo(input),
            scheduler: SCHEDULER,
        };

        tracing::info!("Generating photo for band {:?} ({})", input.name, input.year);

        super::with_timeout(self.timeout, "Photo generation", async {
            let images = self.service.generate_images(&request).await?;
            if images.is_empty() {
                return Err(Error::UpstreamGeneration(
                    "Image generation returned no assets".to_string(),
                ));
            }

            let request_id = Uuid::new_v4().simple().to_string();
            let mut urls = Vec::with_capacity(images.len());
            for (index, image) in images.iter().enumerate() {
                let format = detect_image_format(image);
                let key = format!(
                    "{}/{}_{}.{}",
                    PHOTO_KEY_PREFIX, request_id, index, format.extension
                );
                urls.push(self.storage.put(&key, image, format.mime).await?);
            }

            tracing::info!("Stored {} photo asset(s) for request {}", urls.len(), request_id);

            let photo_reference = urls.swap_remove(0);
            Ok(PhotoResult { photo_reference })
        })
        .await
    }
}
