use crate::ai::{TextGenerationRequest, TextGenerationService};
use crate::models::{GeneratedTextResult, PromptInput};
use crate::{metrics, prompts, Error, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

pub const TEMPERATURE: f32 = 0.75;
pub const MAX_NEW_TOKENS: u32 = 800;

pub struct TextGenerationOrchestrator {
    service: Arc<dyn TextGenerationService>,
    timeout: Option<Duration>,
}

impl TextGenerationOrchestrator {
    pub fn new(service: Arc<dyn TextGenerationService>) -> Self {
        Self {
            service,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stream a write-up for `input` to completion and compute its metrics.
    pub async fn generate(&self, input: &PromptInput) -> Result<GeneratedTextResult> {
        let request = TextGenerationRequest {
            prompt: prompts::band_text(input),
            temperature: TEMPERATURE,
            max_new_tokens: MAX_NEW_TOKENS,
        };

        tracing::info!("Generating text for band {:?} ({})", input.name, input.year);

        let accumulated = super::with_timeout(self.timeout, "Text generation", async {
            let mut stream = self.service.stream_text(&request).await?;
            let mut text = String::new();
            let mut chunks = 0usize;
            while let Some(chunk) = stream.next().await {
                text.push_str(&chunk?);
                chunks += 1;
            }
            tracing::debug!("Received {} chunk(s), {} bytes", chunks, text.len());
            Ok::<_, Error>(text)
        })
        .await?;

        let generated_text = accumulated.trim().to_string();
        Ok(GeneratedTextResult {
            capitalized_words_count: metrics::capitalized_words_count(&generated_text),
            words_followed_by_numbers_count: metrics::words_followed_by_numbers_count(
                &generated_text,
            ),
            year_parity: metrics::year_parity(input.year),
            generated_text,
        })
    }
}
