//! HTTP server layer for the descrambling proxy.
//!
//! This module provides the HTTP API for serving restored comic pages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            GET /photos/{photo_id}/{image_name}                  │
//! │            GET /proxy?url=...                                   │
//! │                                                                 │
//! │  ┌─────────────────────────┐  ┌─────────────────────────────┐   │
//! │  │        handlers         │  │          routes             │   │
//! │  │ (requests, error maps)  │  │  (router config, CORS)      │   │
//! │  └─────────────────────────┘  └─────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, page_handler, proxy_handler, AppState, ErrorResponse, HealthResponse,
    PagePathParams, PageQueryParams, ProxyQueryParams,
};
pub use routes::{create_default_router, create_router, RouterConfig};
