use super::client::{ModelRef, ReplicateHttpClient};
use super::types::{Prediction, PredictionStatus};
use crate::ai::{ImageGenerationRequest, ImageGenerationService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct ReplicateImageClient {
    http: ReplicateHttpClient,
    model: ModelRef,
    poll_interval: Duration,
}

impl ReplicateImageClient {
    pub fn new(http: ReplicateHttpClient, model: ModelRef) -> Self {
        Self {
            http,
            model,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until the prediction reaches a terminal status.
    async fn wait_for_completion(&self, mut prediction: Prediction) -> Result<Prediction> {
        while !prediction.status.is_terminal() {
            let get_url = prediction.urls.get.clone().ok_or_else(|| {
                Error::UpstreamGeneration(format!(
                    "Prediction {} is {:?} but has no status URL",
                    prediction.id, prediction.status
                ))
            })?;
            tracing::debug!(
                "Prediction {} is {:?}, polling again in {:?}",
                prediction.id,
                prediction.status,
                self.poll_interval
            );
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.http.get_prediction(&get_url).await?;
        }
        Ok(prediction)
    }
}

#[async_trait]
impl ImageGenerationService for ReplicateImageClient {
    async fn generate_images(&self, request: &ImageGenerationRequest) -> Result<Vec<Vec<u8>>> {
        let prediction = self
            .http
            .create_prediction(&self.model, request, false, true)
            .await?;
        let prediction = self.wait_for_completion(prediction).await?;

        if prediction.status != PredictionStatus::Succeeded {
            let message = prediction.error_message();
            tracing::error!("Prediction {} failed: {}", prediction.id, message);
            return Err(Error::UpstreamGeneration(message));
        }

        let locations = prediction.output_urls();
        tracing::info!(
            "Prediction {} produced {} output(s)",
            prediction.id,
            locations.len()
        );

        let mut images = Vec::with_capacity(locations.len());
        for location in &locations {
            images.push(self.http.download(location).await?);
        }
        Ok(images)
    }
}
