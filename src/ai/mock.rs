use super::{
    ImageGenerationRequest, ImageGenerationService, TextGenerationRequest, TextGenerationService,
    TextStream,
};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};

/// A tiny valid PNG used as the default generated asset.
pub const MOCK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone)]
enum MockTextResponse {
    Chunks(Vec<String>),
    /// Chunks delivered before the stream itself fails.
    ChunksThenError(Vec<String>, String),
    Rejected(String),
}

#[derive(Clone)]
pub struct MockTextGenerationClient {
    responses: Arc<Mutex<Vec<MockTextResponse>>>,
    requests: Arc<Mutex<Vec<TextGenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockTextGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_chunks(self, chunks: &[&str]) -> Self {
        self.responses.lock().unwrap().push(MockTextResponse::Chunks(
            chunks.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn with_stream_error(self, chunks: &[&str], message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockTextResponse::ChunksThenError(
                chunks.iter().map(|c| c.to_string()).collect(),
                message.to_string(),
            ));
        self
    }

    pub fn with_rejection(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockTextResponse::Rejected(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<TextGenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockTextGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerationService for MockTextGenerationClient {
    async fn stream_text(&self, request: &TextGenerationRequest) -> Result<TextStream> {
        let index = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count - 1
        };
        self.requests.lock().unwrap().push(request.clone());

        let response = {
            let responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                MockTextResponse::Chunks(vec![
                    "A mock paragraph ".to_string(),
                    "about a band.".to_string(),
                ])
            } else {
                responses[index % responses.len()].clone()
            }
        };

        match response {
            MockTextResponse::Chunks(chunks) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            MockTextResponse::ChunksThenError(chunks, message) => Ok(stream::iter(
                chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(Error::UpstreamGeneration(message)))),
            )
            .boxed()),
            MockTextResponse::Rejected(message) => Err(Error::UpstreamGeneration(message)),
        }
    }
}

#[derive(Clone)]
pub struct MockImageGenerationClient {
    responses: Arc<Mutex<Vec<Vec<Vec<u8>>>>>,
    failure: Arc<Mutex<Option<String>>>,
    requests: Arc<Mutex<Vec<ImageGenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue one generation result consisting of the given assets.
    pub fn with_images(self, images: Vec<Vec<u8>>) -> Self {
        self.responses.lock().unwrap().push(images);
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<ImageGenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_images(&self, request: &ImageGenerationRequest) -> Result<Vec<Vec<u8>>> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::UpstreamGeneration(message));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(vec![MOCK_PNG.to_vec()])
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
