use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    routes::{validate_device_id, AppState},
    services::stats::{self, StatsOverview},
};

pub async fn overview(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> AppResult<Json<StatsOverview>> {
    validate_device_id(&device_id)?;

    let history = state.devices.load_history(&device_id).await;
    Ok(Json(stats::overview(&history, &state.catalog)))
}
