//! Storage for generated photo assets
//!
//! Persists asset bytes under a key and returns a URL the client can use to
//! retrieve them. Backends: a local directory served by this process, or an
//! S3-compatible bucket.

pub mod local;
pub mod mock;
pub mod s3;

pub use local::LocalBlobStorage;
pub use mock::MockBlobStorage;
pub use s3::S3BlobStorage;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Write `data` under `key`, replacing any existing object, and return
    /// its retrievable URL.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
}

/// Join a base URL and a key with exactly one slash.
pub(crate) fn public_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::public_url;

    #[test]
    fn test_public_url_normalizes_slashes() {
        assert_eq!(
            public_url("https://cdn.test/", "/photos/a.png"),
            "https://cdn.test/photos/a.png"
        );
        assert_eq!(public_url("http://localhost:8000", "a.png"), "http://localhost:8000/a.png");
    }
}
