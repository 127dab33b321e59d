//! Firestore REST implementation.
//!
//! Writes go through `documents:commit` so the `timestamp` field can be set
//! from the server clock with a field transform. Reads use a structured
//! query ordered by that field.

use super::MetadataRepository;
use crate::models::{Metadata, StoredMetadata, YearParity};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
const TIMESTAMP_FIELD: &str = "timestamp";

/// Typed Firestore value. Integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    StringValue(String),
    IntegerValue(String),
    DoubleValue(f64),
    BooleanValue(bool),
    TimestampValue(DateTime<Utc>),
    NullValue(Option<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryItem {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<serde_json::Value>,
}

pub struct FirestoreRepository {
    client: Client,
    base_url: String,
    project_id: String,
    collection: String,
    access_token: String,
}

impl FirestoreRepository {
    pub fn new(project_id: String, access_token: String, collection: String) -> Self {
        Self::new_with_client(project_id, access_token, collection, Client::new())
    }

    pub fn new_with_client(
        project_id: String,
        access_token: String,
        collection: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id,
            collection,
            access_token,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    async fn post<Resp: DeserializeOwned>(&self, action: &str, body: &serde_json::Value) -> Result<Resp> {
        let url = format!("{}/v1/{}:{}", self.base_url, self.database_path(), action);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach Firestore: {}", e);
                Error::Persistence(format!("Failed to reach Firestore: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Firestore {} error (status {}): {}", action, status, error_text);
            return Err(Error::Persistence(format!(
                "Firestore {} failed (status {}): {}",
                action, status, error_text
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Persistence(format!("Failed to read Firestore response: {}", e)))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse Firestore response: {}\nBody: {}", e, text);
            Error::Persistence(format!("Failed to parse Firestore response: {}", e))
        })
    }
}

pub fn metadata_to_fields(metadata: &Metadata) -> HashMap<String, FirestoreValue> {
    let string = |s: &str| FirestoreValue::StringValue(s.to_string());
    let integer = |n: i64| FirestoreValue::IntegerValue(n.to_string());
    let parity = match metadata.year_parity {
        YearParity::Odd => "Odd",
        YearParity::Even => "Even",
    };

    HashMap::from([
        ("generated_text".to_string(), string(&metadata.generated_text)),
        ("photo_url".to_string(), string(&metadata.photo_url)),
        (
            "capitalized_words_count".to_string(),
            integer(metadata.capitalized_words_count as i64),
        ),
        (
            "words_followed_by_numbers_count".to_string(),
            integer(metadata.words_followed_by_numbers_count as i64),
        ),
        ("year_parity".to_string(), string(parity)),
        ("name".to_string(), string(&metadata.name)),
        ("band".to_string(), string(&metadata.band)),
        ("year".to_string(), integer(metadata.year)),
    ])
}

fn field<'a>(document: &'a Document, key: &str) -> Result<&'a FirestoreValue> {
    document.fields.get(key).ok_or_else(|| {
        Error::Persistence(format!("Document {} is missing field '{}'", document.name, key))
    })
}

fn string_field(document: &Document, key: &str) -> Result<String> {
    match field(document, key)? {
        FirestoreValue::StringValue(s) => Ok(s.clone()),
        other => Err(Error::Persistence(format!(
            "Field '{}' is not a string: {:?}",
            key, other
        ))),
    }
}

fn integer_field(document: &Document, key: &str) -> Result<i64> {
    match field(document, key)? {
        FirestoreValue::IntegerValue(raw) => raw.parse().map_err(|_| {
            Error::Persistence(format!("Field '{}' has invalid integer '{}'", key, raw))
        }),
        other => Err(Error::Persistence(format!(
            "Field '{}' is not an integer: {:?}",
            key, other
        ))),
    }
}

fn count_field(document: &Document, key: &str) -> Result<u64> {
    let value = integer_field(document, key)?;
    u64::try_from(value)
        .map_err(|_| Error::Persistence(format!("Field '{}' is negative: {}", key, value)))
}

pub fn document_to_stored(document: &Document) -> Result<StoredMetadata> {
    let year_parity = match string_field(document, "year_parity")?.as_str() {
        "Odd" => YearParity::Odd,
        "Even" => YearParity::Even,
        other => {
            return Err(Error::Persistence(format!(
                "Field 'year_parity' has unexpected value '{}'",
                other
            )))
        }
    };
    let timestamp = match field(document, TIMESTAMP_FIELD)? {
        FirestoreValue::TimestampValue(ts) => *ts,
        other => {
            return Err(Error::Persistence(format!(
                "Field 'timestamp' is not a timestamp: {:?}",
                other
            )))
        }
    };
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or(&document.name)
        .to_string();

    Ok(StoredMetadata {
        id,
        timestamp,
        metadata: Metadata {
            generated_text: string_field(document, "generated_text")?,
            photo_url: string_field(document, "photo_url")?,
            capitalized_words_count: count_field(document, "capitalized_words_count")?,
            words_followed_by_numbers_count: count_field(
                document,
                "words_followed_by_numbers_count",
            )?,
            year_parity,
            name: string_field(document, "name")?,
            band: string_field(document, "band")?,
            year: integer_field(document, "year")?,
        },
    })
}

#[async_trait]
impl MetadataRepository for FirestoreRepository {
    async fn store(&self, metadata: &Metadata) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let document = Document {
            name: format!("{}/{}/{}", self.database_path(), self.collection, id),
            fields: metadata_to_fields(metadata),
        };
        let body = json!({
            "writes": [{
                "update": document,
                "currentDocument": { "exists": false },
                "updateTransforms": [{
                    "fieldPath": TIMESTAMP_FIELD,
                    "setToServerValue": "REQUEST_TIME"
                }]
            }]
        });

        let response: CommitResponse = self.post("commit", &body).await?;
        if response.write_results.is_empty() {
            return Err(Error::Persistence(
                "Firestore commit returned no write results".to_string(),
            ));
        }

        tracing::info!("Stored metadata document {} in {}", id, self.collection);
        Ok(id)
    }

    async fn fetch_latest(&self) -> Result<StoredMetadata> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "orderBy": [{
                    "field": { "fieldPath": TIMESTAMP_FIELD },
                    "direction": "DESCENDING"
                }],
                "limit": 1
            }
        });

        let items: Vec<RunQueryItem> = self.post("runQuery", &body).await?;
        let document = items
            .into_iter()
            .find_map(|item| item.document)
            .ok_or_else(|| Error::NotFound("No document found".to_string()))?;

        tracing::debug!("Fetched latest metadata document {}", document.name);
        document_to_stored(&document)
    }
}
