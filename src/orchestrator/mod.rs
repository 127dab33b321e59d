//! Request orchestration
//!
//! Each orchestrator sequences the capability calls for one inbound operation
//! and shapes the results into the service's own models. The two generation
//! flows are independent; callers combine their outputs into a
//! [`Metadata`](crate::models::Metadata) record themselves.

pub mod photo;
pub mod text;

pub use photo::PhotoGenerationOrchestrator;
pub use text::TextGenerationOrchestrator;

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Bound `operation` by `limit` when one is configured.
pub(crate) async fn with_timeout<T, F>(limit: Option<Duration>, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            tracing::warn!("{} timed out after {:?}", operation, limit);
            Error::Timeout(format!("{} did not finish within {:?}", operation, limit))
        })?,
        None => fut.await,
    }
}
