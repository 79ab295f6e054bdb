pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_image,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::CapturedImageForm,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "detections", description = "Captured image upload"),
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
    pub fn new(config: UploadConfig, storage: Arc<dyn StorageService>) -> Self {
        let upload_service = Arc::new(UploadService::new(config.clone(), storage.clone()));
        Self {
            storage,
            upload_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let detections = ServeDir::new(state.storage.destination_dir());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/",
            any(api::handlers::upload::upload_image)
                .layer(DefaultBodyLimit::max(state.config.body_limit())),
        )
        .route(
            "/index.php",
            any(api::handlers::upload::upload_image)
                .layer(DefaultBodyLimit::max(state.config.body_limit())),
        )
        .nest_service("/detections", detections)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(api::middleware::trace::make_request_span)
                .on_request(api::middleware::trace::log_request)
                .on_response(api::middleware::trace::log_response),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
