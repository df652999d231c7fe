pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
pub mod storage;
pub mod utils;

use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{AppConfig, StorageBackendKind};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keepsy API",
        version = "1.0.0",
        description = "API for storing and retrieving bills"
    ),
    tags(
        (name = "Bills", description = "Bill upload, listing and download"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    let config = state.config.clone();
    let mut router = router
        .route("/health", get(handlers::health::health))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api));

    // Local references are plain URLs under the serve path.
    let storage = &config.storage;
    if storage.backend == StorageBackendKind::Local {
        router = router.nest_service(
            &storage.local.serve_path,
            ServeDir::new(&storage.local.base_path),
        );
    }

    if let Some(cors) = cors_layer(&config) {
        router = router.layer(cors);
    }

    router
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    let cors = &config.server.cors;
    if cors.allow_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(cors.max_age)),
    )
}
