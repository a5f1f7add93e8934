pub mod events;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod openapi;

use crate::core::services::TodoService;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderName, Method, StatusCode, header},
    routing::get,
};
use std::{path::Path, sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

async fn health(State(service): State<Arc<TodoService>>) -> (StatusCode, &'static str) {
    match service.health().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Full application router: `/api`, health, OpenAPI document and, when the
/// directory exists, the frontend build with an `index.html` fallback.
pub fn build_router(service: Arc<TodoService>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health).with_state(service.clone()))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", handlers::api_routes(service));

    if let Some(dir) = static_dir.filter(|d| d.is_dir()) {
        tracing::info!("Serving frontend from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))));
    }

    app.layer(CompressionLayer::new()) // Gzip compression, skipped for event streams
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(identity::USER_ID_HEADER)]),
        )
        .layer(TraceLayer::new_for_http())
}
