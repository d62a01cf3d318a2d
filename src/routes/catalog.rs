use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{MealTime, MenuItem},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub meal_time: Option<MealTime>,
}

/// Lists catalog items, optionally only those served at `meal_time`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Json<Vec<MenuItem>> {
    let items = state
        .catalog
        .items()
        .iter()
        .filter(|item| {
            query
                .meal_time
                .map_or(true, |meal_time| item.meal_times.contains(&meal_time))
        })
        .cloned()
        .collect();

    Json(items)
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> AppResult<Json<MenuItem>> {
    state
        .catalog
        .get(&item_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Menu item {}", item_id)))
}
