use super::client::{ModelRef, ReplicateHttpClient};
use super::sse::{SseBuffer, SseEvent, MAX_SSE_BUFFER_SIZE};
use super::types::{StreamDonePayload, StreamErrorPayload};
use crate::ai::{TextGenerationRequest, TextGenerationService, TextStream};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub struct ReplicateTextClient {
    http: ReplicateHttpClient,
    model: ModelRef,
}

impl ReplicateTextClient {
    pub fn new(http: ReplicateHttpClient, model: ModelRef) -> Self {
        Self { http, model }
    }
}

/// What a single stream event means for the consumer.
enum StreamStep {
    Chunk(String),
    Ignore,
    Finished,
    Failed(Error),
}

fn interpret_event(event: SseEvent) -> StreamStep {
    match event.event.as_str() {
        "output" => StreamStep::Chunk(event.data),
        "error" => {
            let detail = serde_json::from_str::<StreamErrorPayload>(&event.data)
                .ok()
                .and_then(|payload| payload.detail)
                .unwrap_or(event.data);
            StreamStep::Failed(Error::UpstreamGeneration(detail))
        }
        "done" => {
            let payload: StreamDonePayload = serde_json::from_str(&event.data).unwrap_or_default();
            match payload.reason.as_deref() {
                Some(reason @ ("error" | "canceled")) => StreamStep::Failed(
                    Error::UpstreamGeneration(format!("Prediction stream ended: {}", reason)),
                ),
                _ => StreamStep::Finished,
            }
        }
        _ => StreamStep::Ignore,
    }
}

/// Forward the response's output events into `tx` until the stream finishes
/// or fails. Returns as soon as the receiver goes away, even while the
/// upstream is silent, so the connection is released with it.
async fn pump_events(response: reqwest::Response, tx: mpsc::Sender<Result<String>>) {
    let outcome = tokio::select! {
        outcome = relay_events(response, &tx) => outcome,
        _ = tx.closed() => {
            tracing::debug!("Stream consumer dropped, closing prediction stream");
            return;
        }
    };

    if let Err(e) = outcome {
        tracing::error!("Prediction stream failed: {}", e);
        let _ = tx.send(Err(e)).await;
    }
}

async fn relay_events(
    response: reqwest::Response,
    tx: &mpsc::Sender<Result<String>>,
) -> Result<()> {
    let mut body = response.bytes_stream();
    let mut buffer = SseBuffer::new();

    while let Some(chunk) = body.next().await {
        let events = buffer.push(&chunk?);
        if buffer.len() > MAX_SSE_BUFFER_SIZE {
            return Err(Error::UpstreamGeneration(format!(
                "Stream buffer exceeded {} bytes without an event delimiter",
                MAX_SSE_BUFFER_SIZE
            )));
        }

        for event in events {
            if relay(event, tx).await? {
                return Ok(());
            }
        }
    }

    if let Some(event) = buffer.finish() {
        if relay(event, tx).await? {
            return Ok(());
        }
    }

    // Output cut off before `done` is a truncated write-up, not a result.
    Err(Error::UpstreamGeneration(
        "Prediction stream closed before completion".to_string(),
    ))
}

/// Returns true once nothing more should be relayed.
async fn relay(event: SseEvent, tx: &mpsc::Sender<Result<String>>) -> Result<bool> {
    match interpret_event(event) {
        StreamStep::Chunk(text) => Ok(tx.send(Ok(text)).await.is_err()),
        StreamStep::Ignore => Ok(false),
        StreamStep::Finished => Ok(true),
        StreamStep::Failed(e) => Err(e),
    }
}

#[async_trait]
impl TextGenerationService for ReplicateTextClient {
    async fn stream_text(&self, request: &TextGenerationRequest) -> Result<TextStream> {
        let prediction = self
            .http
            .create_prediction(&self.model, request, true, false)
            .await?;

        let stream_url = prediction.urls.stream.clone().ok_or_else(|| {
            Error::UpstreamGeneration(format!(
                "Prediction {} does not support streaming",
                prediction.id
            ))
        })?;

        tracing::info!("Streaming prediction {} from {}", prediction.id, self.model);

        let response = self.http.open_stream(&stream_url).await?;
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(pump_events(response, tx));

        Ok(ReceiverStream::new(rx).boxed())
    }
}
