pub mod api;
pub mod client;
pub mod config;
pub mod infrastructure;
pub mod logging;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Json, Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadForm,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "upload", description = "File upload endpoint"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub upload_service: Arc<UploadService>,
    pub config: UploadConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageService>, config: UploadConfig) -> Self {
        let upload_service = Arc::new(UploadService::new(storage.clone(), config.clone()));
        Self {
            storage,
            upload_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::handlers::index::upload_form))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/upload",
            post(api::handlers::upload::upload_file)
                .layer(axum::extract::DefaultBodyLimit::max(state.config.body_limit())),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
