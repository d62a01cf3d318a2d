use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{history::FAVORITES_MAX, MenuItem},
    routes::{validate_device_id, AppState},
};

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub ids: Vec<String>,
    /// Favorites that are still in the catalog, in favorite order
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub item_id: String,
    pub favorite: bool,
    pub count: usize,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> AppResult<Json<FavoritesResponse>> {
    validate_device_id(&device_id)?;

    let favorites = state.devices.load_favorites(&device_id).await;
    let items = favorites
        .ids()
        .iter()
        .filter_map(|id| state.catalog.get(id))
        .cloned()
        .collect();

    Ok(Json(FavoritesResponse {
        ids: favorites.ids().to_vec(),
        items,
    }))
}

pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((device_id, item_id)): Path<(String, String)>,
) -> AppResult<Json<ToggleResponse>> {
    validate_device_id(&device_id)?;
    if state.catalog.get(&item_id).is_none() {
        return Err(AppError::NotFound(format!("Menu item {}", item_id)));
    }

    let _guard = state.locks.acquire(&device_id).await;
    let mut favorites = state.devices.load_favorites(&device_id).await;

    if !favorites.contains(&item_id) && favorites.len() >= FAVORITES_MAX {
        return Err(AppError::InvalidInput(format!(
            "At most {} favorites can be kept",
            FAVORITES_MAX
        )));
    }

    let favorite = favorites.toggle(&item_id);
    state.devices.save_favorites(&device_id, &favorites).await?;

    tracing::info!(
        request_id = %request_id,
        device_id = %device_id,
        item_id = %item_id,
        favorite,
        "Toggled favorite"
    );

    Ok(Json(ToggleResponse {
        item_id,
        favorite,
        count: favorites.len(),
    }))
}

/// Removing an id that is not a favorite is a no-op
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path((device_id, item_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    validate_device_id(&device_id)?;

    let _guard = state.locks.acquire(&device_id).await;
    let mut favorites = state.devices.load_favorites(&device_id).await;

    if favorites.remove(&item_id) {
        state.devices.save_favorites(&device_id, &favorites).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}
