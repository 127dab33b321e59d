use super::types::{Prediction, PredictionRequest};
use crate::{Error, Result};
use base64::Engine as _;
use reqwest::{Client, Response};
use serde::Serialize;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

/// A model reference of the form `owner/name` or `owner/name:version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub owner: String,
    pub name: String,
    pub version: Option<String>,
}

impl FromStr for ModelRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (path, version) = match s.split_once(':') {
            Some((path, version)) if !version.is_empty() => (path, Some(version.to_string())),
            Some(_) => return Err(Error::Config(format!("Empty model version in '{}'", s))),
            None => (s, None),
        };
        match path.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    version,
                })
            }
            _ => Err(Error::Config(format!(
                "Invalid model '{}'. Expected owner/name[:version]",
                s
            ))),
        }
    }
}

impl ModelRef {
    fn predictions_path(&self) -> String {
        match self.version {
            Some(_) => "/v1/predictions".to_string(),
            None => format!("/v1/models/{}/{}/predictions", self.owner, self.name),
        }
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}

/// Shared HTTP plumbing for the prediction API.
#[derive(Clone)]
pub struct ReplicateHttpClient {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) base_url: String,
}

impl ReplicateHttpClient {
    pub fn new(api_token: String) -> Self {
        Self::new_with_client(api_token, Client::new())
    }

    pub fn new_with_client(api_token: String, client: Client) -> Self {
        Self {
            client,
            api_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("Prediction API error (status {}): {}", status, error_text);
        Err(Error::UpstreamGeneration(format!(
            "Prediction API error (status {}): {}",
            status, error_text
        )))
    }

    /// Create a prediction. With `wait`, the API holds the request open until
    /// the prediction finishes or its own deadline passes.
    pub async fn create_prediction<I: Serialize>(
        &self,
        model: &ModelRef,
        input: &I,
        stream: bool,
        wait: bool,
    ) -> Result<Prediction> {
        let url = format!("{}{}", self.base_url, model.predictions_path());
        let body = PredictionRequest {
            version: model.version.as_deref(),
            input,
            stream,
        };

        tracing::debug!("Creating prediction for {} (stream: {})", model, stream);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body);
        if wait {
            request = request.header("Prefer", "wait");
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to send prediction request: {}", e);
            e
        })?;
        let response = Self::ensure_success(response).await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse prediction: {}\nBody: {}", e, text);
            Error::UpstreamGeneration(format!("Failed to parse prediction: {}", e))
        })
    }

    pub async fn get_prediction(&self, url: &str) -> Result<Prediction> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Open a prediction's server-sent event stream.
    pub async fn open_stream(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-store")
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    /// Fetch an output file. `data:` URIs are decoded in place.
    pub async fn download(&self, location: &str) -> Result<Vec<u8>> {
        if let Some(rest) = location.strip_prefix("data:") {
            let (_, payload) = rest.split_once(',').ok_or_else(|| {
                Error::UpstreamGeneration("Malformed data URI in prediction output".to_string())
            })?;
            return base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| {
                    Error::UpstreamGeneration(format!("Failed to decode base64 output: {}", e))
                });
        }

        let response = self.client.get(location).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
