//! Fronteira REST API
//!
//! The backend service for the twin-cities platform.
//! Handles:
//! - CRUD endpoints for all content entities
//! - File uploads and downloads
//! - Rate limiting
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use fronteira_common::{
    config::AppConfig,
    db::DbPool,
    metrics as app_metrics,
    storage::UploadStore,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub uploads: UploadStore,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .json()
        .init();

    info!("Starting Fronteira API v{}", fronteira_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .set_buckets_for_metric(
                Matcher::Full(format!(
                    "{}_request_duration_seconds",
                    app_metrics::METRICS_PREFIX
                )),
                app_metrics::LATENCY_BUCKETS,
            )?
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    app_metrics::register_metrics();

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;

    // Initialize upload storage
    let uploads = UploadStore::new(&config.uploads);
    uploads.init().await?;

    // Create app state
    let state = AppState {
        config: config.clone(),
        db: db.clone(),
        uploads,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration: public informational API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Location endpoints
        .route("/locations", get(handlers::locations::list_locations)
            .post(handlers::locations::create_location))
        .route("/locations/{id}", get(handlers::locations::get_location)
            .put(handlers::locations::update_location)
            .delete(handlers::locations::delete_location))

        // Twin city endpoints
        .route("/twin-cities", get(handlers::twin_cities::list_twin_cities)
            .post(handlers::twin_cities::create_twin_city))
        .route("/twin-cities/{id}", get(handlers::twin_cities::get_twin_city)
            .put(handlers::twin_cities::update_twin_city)
            .delete(handlers::twin_cities::delete_twin_city))

        // Indicator endpoints
        .route("/indicators", get(handlers::indicators::list_indicators)
            .post(handlers::indicators::create_indicator))
        .route("/indicators/{id}", get(handlers::indicators::get_indicator)
            .put(handlers::indicators::update_indicator)
            .delete(handlers::indicators::delete_indicator))

        // Gallery endpoints
        .route("/galleries", get(handlers::galleries::list_galleries)
            .post(handlers::galleries::create_gallery))
        .route("/galleries/{id}", get(handlers::galleries::get_gallery)
            .put(handlers::galleries::update_gallery)
            .delete(handlers::galleries::delete_gallery))

        // Collaboration endpoints
        .route("/collaborations", get(handlers::collaborations::list_collaborations)
            .post(handlers::collaborations::create_collaboration))
        .route("/collaborations/{id}", get(handlers::collaborations::get_collaboration)
            .put(handlers::collaborations::update_collaboration)
            .delete(handlers::collaborations::delete_collaboration))
        .route(
            "/collaborations/{id}/files/{file_id}/download",
            get(handlers::collaborations::download_file),
        )

        // Digital collection endpoints
        .route("/digital-collection", get(handlers::documents::list_documents)
            .post(handlers::documents::create_document))
        .route("/digital-collection/{id}", get(handlers::documents::get_document)
            .put(handlers::documents::update_document)
            .delete(handlers::documents::delete_document))
        .route(
            "/digital-collection/{id}/download",
            get(handlers::documents::download_document),
        );

    // Global rate limiter
    let rate_limit_layer = if state.config.rate_limit.enabled {
        let limit = state.config.rate_limit.requests_per_second;
        let limiter = middleware::rate_limit::create_rate_limiter(
            limit,
            state.config.rate_limit.burst,
        );
        Some(axum::middleware::from_fn(move |request, next| {
            let limiter = limiter.clone();
            async move {
                middleware::rate_limit::rate_limit_middleware(request, next, limiter, limit).await
            }
        }))
    } else {
        None
    };

    let mut app = Router::new()
        .nest("/api", api_routes)
        // Stored images and media are served directly by path
        .nest_service("/uploads", ServeDir::new(&state.config.uploads.root))
        .layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes));

    if let Some(layer) = rate_limit_layer {
        app = app.layer(layer);
    }

    app.with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
