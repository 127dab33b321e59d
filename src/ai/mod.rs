//! AI service integration for text and image generation
//!
//! Defines the two generation capabilities the orchestrators depend on and
//! provides an implementation against a hosted prediction API plus mocks.

pub mod mime;
pub mod mock;
pub mod replicate;

pub use mock::{MockImageGenerationClient, MockTextGenerationClient};
pub use replicate::{ReplicateImageClient, ReplicateTextClient};

use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

/// Finite, non-restartable sequence of text chunks in arrival order.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Input for a streaming text generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextGenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_new_tokens: u32,
}

/// Sampling scheduler understood by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scheduler {
    #[serde(rename = "DDIM")]
    Ddim,
    #[serde(rename = "K_EULER")]
    KEuler,
    #[serde(rename = "K_EULER_ANCESTRAL")]
    KEulerAncestral,
    #[serde(rename = "DPMSolverMultistep")]
    DpmSolverMultistep,
    #[serde(rename = "PNDM")]
    Pndm,
    #[serde(rename = "KLMS")]
    Klms,
}

/// Input for a blocking image generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub scheduler: Scheduler,
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Start a generation and return its output as a stream of chunks.
    async fn stream_text(&self, request: &TextGenerationRequest) -> Result<TextStream>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Run a generation to completion and return every produced asset.
    async fn generate_images(&self, request: &ImageGenerationRequest) -> Result<Vec<Vec<u8>>>;
}
