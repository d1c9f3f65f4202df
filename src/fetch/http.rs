use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;

use super::{FetchedPage, PageFetcher};
use crate::error::FetchError;

/// HTTP-backed implementation of [`PageFetcher`].
///
/// The host's CDN refuses requests without a site Referer, so every request
/// carries the configured Referer and User-Agent. One shared connection
/// pool serves all requests; cloning is cheap.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    referer: String,
}

impl HttpPageFetcher {
    /// Create a fetcher with the given request headers and total deadline
    /// per request.
    pub fn new(
        referer: String,
        user_agent: String,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self { client, referer })
    }

    /// Referer header sent with every request.
    pub fn referer(&self) -> &str {
        &self.referer
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .header(header::REFERER, &self.referer)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    return FetchError::Timeout(url.to_string());
                }
                FetchError::Request(e.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                return FetchError::Timeout(url.to_string());
            }
            FetchError::Request(e.to_string())
        })?;

        Ok(FetchedPage {
            bytes,
            content_type,
        })
    }
}
