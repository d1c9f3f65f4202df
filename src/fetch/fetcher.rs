use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// Trait for fetching page image bytes from an upstream host.
///
/// This abstraction keeps the descrambling pipeline independent of the
/// transport. Production uses HTTP against the host's CDN; tests swap in
/// canned responses. Implementations must be thread-safe.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the full body behind `url`.
    ///
    /// Returns an error for transport failures and for any non-success
    /// status, with 404 distinguished so callers can fall through to the
    /// next candidate host.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Body and content type of a successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Raw response body.
    pub bytes: Bytes,
    /// Upstream `Content-Type`, when one was sent.
    pub content_type: Option<String>,
}

impl FetchedPage {
    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the body is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
