//! Configuration management for the descrambling proxy.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `DESCRAMBLER_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use comic_descrambler::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//!
//! // Access configuration sections
//! println!("Listening on {}:{}", config.host, config.port);
//! println!("Image hosts: {:?}", config.image_hosts);
//! ```
//!
//! # Environment Variables
//!
//! All configuration options can be set via environment variables with the
//! `DESCRAMBLER_` prefix:
//!
//! - `DESCRAMBLER_HOST` - Server bind address (default: 0.0.0.0)
//! - `DESCRAMBLER_PORT` - Server port (default: 3000)
//! - `DESCRAMBLER_IMAGE_HOSTS` - Comma-separated upstream CDN hosts
//! - `DESCRAMBLER_REFERER` - Referer header sent upstream
//! - `DESCRAMBLER_USER_AGENT` - User-Agent header sent upstream
//! - `DESCRAMBLER_FETCH_TIMEOUT` - Upstream request deadline in seconds (default: 30)
//! - `DESCRAMBLER_CACHE_SIZE` - Page cache capacity in bytes (default: 100MB)
//! - `DESCRAMBLER_JPEG_QUALITY` - Default JPEG quality (default: 85)
//! - `DESCRAMBLER_CACHE_MAX_AGE` - Page Cache-Control max-age seconds (default: 1 year)
//! - `DESCRAMBLER_PROXY_CACHE_MAX_AGE` - Proxy Cache-Control max-age seconds (default: 1 day)
//! - `DESCRAMBLER_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use std::time::Duration;

use clap::Parser;

use crate::page::{DEFAULT_PAGE_CACHE_CAPACITY, DEFAULT_PAGE_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default upstream CDN hosts, tried in order on each fetch.
pub const DEFAULT_IMAGE_HOSTS: [&str; 3] = [
    "cdn-msp.jmapinodeudzn.net",
    "cdn-msp2.jmapinodeudzn.net",
    "cdn-msp3.jmapinodeudzn.net",
];

/// Default Referer header; the CDN rejects requests without it.
pub const DEFAULT_REFERER: &str = "https://18comic.vip/";

/// Default User-Agent header sent upstream.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Default upstream request deadline in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default HTTP cache max-age for page responses (1 year; pages are
/// immutable once published).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 31_536_000;

/// Default HTTP cache max-age for proxied responses (1 day).
pub const DEFAULT_PROXY_CACHE_MAX_AGE: u32 = 86_400;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Comic page descrambling proxy.
///
/// Fetches scrambled page images from upstream CDNs, restores the original
/// image by reversing the slice shuffle, and serves the result over HTTP
/// with caching.
#[derive(Parser, Debug, Clone)]
#[command(name = "comic-descrambler")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DESCRAMBLER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DESCRAMBLER_PORT")]
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Upstream CDN hosts to try in order (comma-separated bare hostnames).
    #[arg(
        long,
        env = "DESCRAMBLER_IMAGE_HOSTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_IMAGE_HOSTS.iter().map(|h| h.to_string())
    )]
    pub image_hosts: Vec<String>,

    /// Referer header sent with upstream requests.
    #[arg(long, default_value = DEFAULT_REFERER, env = "DESCRAMBLER_REFERER")]
    pub referer: String,

    /// User-Agent header sent with upstream requests.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "DESCRAMBLER_USER_AGENT")]
    pub user_agent: String,

    /// Upstream request deadline in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
        env = "DESCRAMBLER_FETCH_TIMEOUT"
    )]
    pub fetch_timeout: u64,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Page cache capacity in bytes.
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_CACHE_CAPACITY,
        env = "DESCRAMBLER_CACHE_SIZE"
    )]
    pub cache_size: usize,

    /// HTTP Cache-Control max-age for page responses, in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_CACHE_MAX_AGE,
        env = "DESCRAMBLER_CACHE_MAX_AGE"
    )]
    pub cache_max_age: u32,

    /// HTTP Cache-Control max-age for proxied responses, in seconds.
    #[arg(
        long,
        default_value_t = DEFAULT_PROXY_CACHE_MAX_AGE,
        env = "DESCRAMBLER_PROXY_CACHE_MAX_AGE"
    )]
    pub proxy_cache_max_age: u32,

    // =========================================================================
    // Encoding Configuration
    // =========================================================================
    /// Default JPEG quality for reassembled pages (1-100).
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_QUALITY,
        env = "DESCRAMBLER_JPEG_QUALITY"
    )]
    pub jpeg_quality: u8,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DESCRAMBLER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        // At least one upstream host, all bare hostnames
        if self.image_hosts.is_empty() {
            return Err(
                "At least one image host is required. \
                 Set --image-hosts or DESCRAMBLER_IMAGE_HOSTS"
                    .to_string(),
            );
        }
        for host in &self.image_hosts {
            if host.is_empty() {
                return Err("Image hosts must not be empty".to_string());
            }
            if host.contains("://") {
                return Err(format!(
                    "Image host '{}' must be a bare hostname, not a URL",
                    host
                ));
            }
        }

        // Validate upstream headers
        if self.referer.is_empty() {
            return Err("Referer must not be empty; the upstream CDN requires it".to_string());
        }
        if self.user_agent.is_empty() {
            return Err("User-Agent must not be empty".to_string());
        }

        // Validate timeouts and cache sizes
        if self.fetch_timeout == 0 {
            return Err("fetch_timeout must be greater than 0".to_string());
        }
        if self.cache_size == 0 {
            return Err("cache_size must be greater than 0".to_string());
        }

        // Validate JPEG quality
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upstream request deadline as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

// =============================================================================
// Tests
// =============================================================================
