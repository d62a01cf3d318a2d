use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    catalog::Catalog,
    config::RecommendSettings,
    db::KeyValueStore,
    error::{AppError, AppResult},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::device_store::{DeviceLocks, DeviceStore},
};

pub mod catalog;
pub mod devices;
pub mod favorites;
pub mod history;
pub mod recommendations;
pub mod stats;

const MAX_DEVICE_ID_LEN: usize = 64;

/// Shared state for every handler
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub devices: DeviceStore,
    pub settings: RecommendSettings,
    pub locks: DeviceLocks,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        store: Arc<dyn KeyValueStore>,
        settings: RecommendSettings,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            devices: DeviceStore::new(store),
            settings,
            locks: DeviceLocks::new(),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/catalog", get(catalog::list))
        .route("/catalog/:item_id", get(catalog::get_item))
        .route("/devices", post(devices::register))
        .route(
            "/devices/:device_id/recommendations",
            post(recommendations::recommend),
        )
        .route(
            "/devices/:device_id/recommendations/status",
            post(recommendations::status),
        )
        .route(
            "/devices/:device_id/recommendations/pool",
            post(recommendations::pool),
        )
        .route(
            "/devices/:device_id/recommendations/reset",
            post(recommendations::reset),
        )
        .route(
            "/devices/:device_id/history",
            get(history::list).delete(history::clear),
        )
        .route("/devices/:device_id/favorites", get(favorites::list))
        .route(
            "/devices/:device_id/favorites/:item_id",
            put(favorites::toggle).delete(favorites::remove),
        )
        .route("/devices/:device_id/stats", get(stats::overview))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Device ids are opaque, but must be usable inside a store key
pub(crate) fn validate_device_id(device_id: &str) -> AppResult<()> {
    let valid = !device_id.is_empty()
        && device_id.len() <= MAX_DEVICE_ID_LEN
        && device_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Invalid device id: {}",
            device_id
        )))
    }
}
