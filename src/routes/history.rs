use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::HistoryEntry,
    routes::{validate_device_id, AppState},
};

/// Newest first
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    validate_device_id(&device_id)?;
    Ok(Json(state.devices.load_history(&device_id).await))
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(device_id): Path<String>,
) -> AppResult<StatusCode> {
    validate_device_id(&device_id)?;

    let _guard = state.locks.acquire(&device_id).await;
    state.devices.clear_history(&device_id).await?;

    tracing::info!(request_id = %request_id, device_id = %device_id, "Cleared history");

    Ok(StatusCode::NO_CONTENT)
}
