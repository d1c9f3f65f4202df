use thiserror::Error;

/// Errors that can occur when fetching page bytes from an upstream host
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("Request error: {0}")]
    Request(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },

    /// Upstream did not answer within the configured deadline
    #[error("Upstream timed out: {0}")]
    Timeout(String),

    /// Upstream answered 404 for this URL
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Every candidate host was tried and none produced the page
    #[error("No upstream host produced {image_name} for photo {photo_id}")]
    ExhaustedHosts {
        photo_id: String,
        image_name: String,
    },
}

/// Errors produced while turning fetched bytes into a servable page
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// Fetch error while retrieving the page bytes
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Fetched bytes could not be decoded as an image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Reconstructed raster could not be re-encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Request parameters were rejected before any upstream work
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl PageError {
    /// True when the failure originated upstream rather than in this process
    pub fn is_upstream(&self) -> bool {
        matches!(self, PageError::Fetch(_) | PageError::Decode(_))
    }
}
