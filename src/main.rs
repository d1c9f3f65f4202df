//! Comic Descrambler - a descrambling proxy for comic page images.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comic_descrambler::{
    config::Config,
    fetch::HttpPageFetcher,
    page::PageService,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!("  Upstream hosts: {}", config.image_hosts.join(", "));
    info!("  Referer: {}", config.referer);
    info!("  Fetch timeout: {}s", config.fetch_timeout);
    info!(
        "  Cache: {}MB pages, max-age {}s",
        config.cache_size / (1024 * 1024),
        config.cache_max_age
    );
    info!("  JPEG quality: {}", config.jpeg_quality);

    // Create the upstream fetcher
    let fetcher = match HttpPageFetcher::new(
        config.referer.clone(),
        config.user_agent.clone(),
        config.fetch_timeout(),
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Create the page service
    let page_service =
        PageService::with_cache_capacity(fetcher, config.image_hosts.clone(), config.cache_size);

    // Build router
    let router_config = build_router_config(&config);
    let router = create_router(page_service, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/photos/<photo_id>/<image_name>", addr);
    info!("    curl 'http://{}/proxy?url=<media_url>'", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("  comic-descrambler v{}", version);
    info!("  Fetch, descramble and serve scrambled comic pages");
    info!("");
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "comic_descrambler=debug,tower_http=debug"
    } else {
        "comic_descrambler=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_proxy_cache_max_age(config.proxy_cache_max_age)
        .with_default_quality(config.jpeg_quality);

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}
