//! HTTP surface
//!
//! Generation endpoints always answer 200 with an [`Envelope`]; metadata
//! endpoints use status codes so callers can tell "no data yet" (404) from a
//! broken backend (500).

use crate::app::App;
use crate::models::{
    Envelope, GenerateRequest, GeneratedTextResult, Metadata, PhotoResult, StoredMetadata,
};
use crate::Error;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreMetadataResponse {
    pub document_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Failure of a metadata operation, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorDetail {
                detail: self.detail,
            }),
        )
            .into_response()
    }
}

pub fn router(app: Arc<App>) -> Router {
    let photo_dir = app.photo_dir().map(|dir| dir.to_path_buf());

    let mut router = Router::new()
        .route("/generate_text/", post(generate_text))
        .route("/generate_photo/", post(generate_photo))
        .route("/store_metadata/", post(store_metadata))
        .route("/get_last_metadata/", get(get_last_metadata));

    if let Some(dir) = photo_dir {
        router = router.nest_service("/photos", ServeDir::new(dir));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

async fn generate_text(
    State(app): State<Arc<App>>,
    Json(request): Json<GenerateRequest>,
) -> Json<Envelope<GeneratedTextResult>> {
    Json(app.generate_text(&request.prompt).await)
}

async fn generate_photo(
    State(app): State<Arc<App>>,
    Json(request): Json<GenerateRequest>,
) -> Json<Envelope<PhotoResult>> {
    Json(app.generate_photo(&request.prompt).await)
}

async fn store_metadata(
    State(app): State<Arc<App>>,
    Json(metadata): Json<Metadata>,
) -> Result<Json<StoreMetadataResponse>, ApiError> {
    match app.store_metadata(&metadata).await {
        Ok(document_id) => {
            info!("Stored metadata for {:?} as {}", metadata.name, document_id);
            Ok(Json(StoreMetadataResponse { document_id }))
        }
        Err(e) => {
            error!("Error storing metadata: {}", e);
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: format!("Error storing metadata: {}", e),
            })
        }
    }
}

async fn get_last_metadata(
    State(app): State<Arc<App>>,
) -> Result<Json<StoredMetadata>, ApiError> {
    match app.fetch_latest_metadata().await {
        Ok(record) => Ok(Json(record)),
        Err(Error::NotFound(_)) => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            detail: "No document found".to_string(),
        }),
        Err(e) => {
            error!("Error fetching data: {}", e);
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: "Internal server error".to_string(),
            })
        }
    }
}
