//! Prediction API request/response payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body for creating a prediction. `version` is only sent for pinned models.
#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a, I: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    pub input: &'a I,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    pub get: Option<String>,
    pub stream: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: PredictionUrls,
}

impl Prediction {
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => format!("prediction {} {:?}", self.id, self.status),
            Some(other) => other.to_string(),
        }
    }

    /// Output locations: a single string or an array of strings. Anything
    /// else yields no outputs.
    pub fn output_urls(&self) -> Vec<String> {
        match &self.output {
            Some(Value::String(url)) => vec![url.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Payload of an `error` stream event.
#[derive(Debug, Deserialize)]
pub struct StreamErrorPayload {
    pub detail: Option<String>,
}

/// Payload of a `done` stream event.
#[derive(Debug, Default, Deserialize)]
pub struct StreamDonePayload {
    pub reason: Option<String>,
}
