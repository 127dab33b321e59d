use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use band_spotlight::{
    ai::{mock::MOCK_PNG, MockImageGenerationClient, MockTextGenerationClient},
    api,
    app::{App, AppServices},
    models::{Metadata, StoredMetadata, YearParity},
    repository::InMemoryMetadataRepository,
    storage::{LocalBlobStorage, MockBlobStorage},
};
use std::sync::Arc;
use tower::ServiceExt;

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = body_bytes(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn prompt() -> serde_json::Value {
    serde_json::json!({
        "prompt": { "name": "Radiohead", "band": "the oxford five", "year": 1997 }
    })
}

#[tokio::test]
async fn test_full_workflow_with_mocks() {
    let text_gen = MockTextGenerationClient::new()
        .with_chunks(&["OK Computer arrived in ", "1997 and Radiohead ", "never looked back."]);
    let storage = MockBlobStorage::new().with_base_url("https://test-cdn.com".to_string());
    let uploads = storage.clone();

    let app = App::with_services(
        AppServices {
            text_gen: Arc::new(text_gen),
            image_gen: Arc::new(MockImageGenerationClient::new()),
            storage: Arc::new(storage),
            repository: Arc::new(InMemoryMetadataRepository::new()),
        },
        None,
    );
    let router = api::router(Arc::new(app));

    // Nothing stored yet
    let (status, body) = call(&router, get("/get_last_metadata/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No document found");

    // Text
    let (status, body) = call(&router, post_json("/generate_text/", prompt())).await;
    assert_eq!(status, StatusCode::OK);
    let text = &body["data"];
    assert_eq!(
        text["generated_text"],
        "OK Computer arrived in 1997 and Radiohead never looked back."
    );
    assert_eq!(text["capitalized_words_count"], 3);
    assert_eq!(text["words_followed_by_numbers_count"], 1);
    assert_eq!(text["year_parity"], "Odd");

    // Photo
    let (status, body) = call(&router, post_json("/generate_photo/", prompt())).await;
    assert_eq!(status, StatusCode::OK);
    let photo_url = body["data"].as_str().unwrap().to_string();
    assert!(photo_url.starts_with("https://test-cdn.com/photos/"));
    assert!(photo_url.ends_with("_0.png"));
    assert_eq!(uploads.get_upload_count(), 1);

    // Store
    let metadata = serde_json::json!({
        "generated_text": text["generated_text"],
        "photo_url": photo_url,
        "capitalized_words_count": text["capitalized_words_count"],
        "words_followed_by_numbers_count": text["words_followed_by_numbers_count"],
        "year_parity": text["year_parity"],
        "name": "Radiohead",
        "band": "the oxford five",
        "year": 1997
    });
    let (status, body) = call(&router, post_json("/store_metadata/", metadata.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let document_id = body["document_id"].as_str().unwrap().to_string();
    assert!(!document_id.is_empty());

    // Fetch
    let (status, body) = call(&router, get("/get_last_metadata/")).await;
    assert_eq!(status, StatusCode::OK);
    let stored: StoredMetadata = serde_json::from_value(body).unwrap();
    let expected: Metadata = serde_json::from_value(metadata).unwrap();
    assert_eq!(stored.id, document_id);
    assert_eq!(stored.metadata, expected);
    assert_eq!(stored.metadata.year_parity, YearParity::Odd);
}

#[tokio::test]
async fn test_latest_metadata_wins() {
    let app = App::with_services(
        AppServices {
            text_gen: Arc::new(MockTextGenerationClient::new()),
            image_gen: Arc::new(MockImageGenerationClient::new()),
            storage: Arc::new(MockBlobStorage::new()),
            repository: Arc::new(InMemoryMetadataRepository::new()),
        },
        None,
    );
    let router = api::router(Arc::new(app));

    let mut last_id = String::new();
    for (name, year) in [("Blur", 1994), ("Oasis", 1995), ("Pulp", 1996)] {
        let parity = if year % 2 == 0 { "Even" } else { "Odd" };
        let (_, body) = call(
            &router,
            post_json(
                "/store_metadata/",
                serde_json::json!({
                    "generated_text": "text",
                    "photo_url": "https://example.com/p.png",
                    "capitalized_words_count": 0,
                    "words_followed_by_numbers_count": 0,
                    "year_parity": parity,
                    "name": name,
                    "band": "britpop",
                    "year": year
                }),
            ),
        )
        .await;
        last_id = body["document_id"].as_str().unwrap().to_string();
    }

    let (status, body) = call(&router, get("/get_last_metadata/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], last_id);
    assert_eq!(body["name"], "Pulp");
    assert_eq!(body["year_parity"], "Even");
}

#[tokio::test]
async fn test_generation_failures_are_error_envelopes() {
    let app = App::with_services(
        AppServices {
            text_gen: Arc::new(
                MockTextGenerationClient::new().with_stream_error(&["Half a "], "stream reset"),
            ),
            image_gen: Arc::new(MockImageGenerationClient::new().with_images(Vec::new())),
            storage: Arc::new(MockBlobStorage::new()),
            repository: Arc::new(InMemoryMetadataRepository::new()),
        },
        None,
    );
    let router = api::router(Arc::new(app));

    let (status, body) = call(&router, post_json("/generate_text/", prompt())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["kind"], "upstream_generation");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("stream reset"));

    let (status, body) = call(&router, post_json("/generate_photo/", prompt())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["kind"], "upstream_generation");
}

#[tokio::test]
async fn test_local_photos_are_served() {
    let dir = tempfile::tempdir().unwrap();
    let served = dir.path().join("photos");
    std::fs::create_dir_all(&served).unwrap();

    let app = App::with_services(
        AppServices {
            text_gen: Arc::new(MockTextGenerationClient::new()),
            image_gen: Arc::new(MockImageGenerationClient::new()),
            storage: Arc::new(LocalBlobStorage::new(
                dir.path().to_path_buf(),
                "http://localhost:8000".to_string(),
            )),
            repository: Arc::new(InMemoryMetadataRepository::new()),
        },
        None,
    )
    .with_photo_dir(served);
    let router = api::router(Arc::new(app));

    let (_, body) = call(&router, post_json("/generate_photo/", prompt())).await;
    let url = body["data"].as_str().unwrap().to_string();
    let path = url.strip_prefix("http://localhost:8000").unwrap();
    assert!(path.starts_with("/photos/"));

    let (status, bytes) = body_bytes(&router, get(path)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, MOCK_PNG);
}
