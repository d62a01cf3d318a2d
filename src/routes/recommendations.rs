use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{HistoryEntry, Recommendation, RecommendRequest},
    routes::{validate_device_id, AppState},
    services::{
        ladder::{PoolInfo, StageName},
        quota::DailyQuotaState,
        recency::recent_item_ids,
        recommendations::{self, date_key},
    },
};

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendation: Recommendation,
    pub stage: StageName,
    pub explanation: String,
    pub attempts_remaining: u32,
    pub max_attempts: u32,
}

/// Today's quota state as it applies to one request
#[derive(Debug, Serialize)]
pub struct QuotaStatus {
    #[serde(flatten)]
    pub state: DailyQuotaState,
    pub attempts_remaining: u32,
}

impl From<DailyQuotaState> for QuotaStatus {
    fn from(state: DailyQuotaState) -> Self {
        Self {
            attempts_remaining: state.remaining(),
            state,
        }
    }
}

fn local_now(state: &AppState) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&state.settings.utc_offset)
}

/// Stored state if it is still today's for this request, otherwise EMPTY
async fn current_quota(
    state: &AppState,
    device_id: &str,
    request: &RecommendRequest,
    now: &DateTime<FixedOffset>,
) -> DailyQuotaState {
    let stored = state.devices.load_today(device_id).await;
    let (quota, _) = DailyQuotaState::resolve(stored, &date_key(now), &request.signature());
    quota
}

async fn recent_ids(
    state: &AppState,
    device_id: &str,
    now: &DateTime<FixedOffset>,
) -> HashSet<String> {
    let history = state.devices.load_history(device_id).await;
    recent_item_ids(
        &history,
        &state.catalog,
        now.with_timezone(&Utc),
        state.settings.recency_window,
    )
}

/// Handler for the recommendation endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(device_id): Path<String>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    validate_device_id(&device_id)?;
    let request = request.normalized();

    tracing::info!(
        request_id = %request_id,
        device_id = %device_id,
        meal_time = %request.meal_time,
        people = request.people,
        "Processing recommendation request"
    );

    let _guard = state.locks.acquire(&device_id).await;
    let now = local_now(&state);

    let mut quota = current_quota(&state, &device_id, &request, &now).await;
    let recent = recent_ids(&state, &device_id, &now).await;

    let outcome = recommendations::recommend(
        &state.catalog,
        &request,
        &mut quota,
        &recent,
        state.settings.alternates,
        now,
    )
    .map_err(|e| {
        tracing::info!(request_id = %request_id, device_id = %device_id, reason = %e, "No recommendation issued");
        e
    })?;

    state.devices.save_today(&device_id, &quota).await?;

    // The attempt is committed once today's state is saved; a lost history
    // entry must not turn it into an error the client cannot retry.
    if let Err(e) = state
        .devices
        .append_history(
            &device_id,
            HistoryEntry::from_recommendation(&outcome.recommendation),
        )
        .await
    {
        tracing::warn!(
            request_id = %request_id,
            device_id = %device_id,
            error = %e,
            "History append failed, recommendation kept"
        );
    }

    tracing::info!(
        request_id = %request_id,
        device_id = %device_id,
        stage = ?outcome.stage,
        attempt = quota.attempt,
        "Recommendation completed"
    );

    Ok(Json(RecommendResponse {
        recommendation: outcome.recommendation,
        stage: outcome.stage,
        explanation: outcome.explanation,
        attempts_remaining: quota.remaining(),
        max_attempts: quota.max_attempts,
    }))
}

/// Read-only view of today's quota for the request
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<QuotaStatus>> {
    validate_device_id(&device_id)?;
    let request = request.normalized();
    let now = local_now(&state);

    let quota = current_quota(&state, &device_id, &request, &now).await;
    Ok(Json(quota.into()))
}

/// Candidate pool per stage, without consuming an attempt
pub async fn pool(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<PoolInfo>> {
    validate_device_id(&device_id)?;
    let request = request.normalized();
    let now = local_now(&state);

    let quota = current_quota(&state, &device_id, &request, &now).await;
    let recent = recent_ids(&state, &device_id, &now).await;

    Ok(Json(recommendations::recommendation_pool(
        &state.catalog,
        &request,
        &quota,
        &recent,
        now,
    )))
}

/// Returns today's quota for the request to EMPTY. History is kept.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(device_id): Path<String>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<QuotaStatus>> {
    validate_device_id(&device_id)?;
    let request = request.normalized();

    let _guard = state.locks.acquire(&device_id).await;
    let now = local_now(&state);

    let mut quota = current_quota(&state, &device_id, &request, &now).await;
    quota.reset();
    state.devices.save_today(&device_id, &quota).await?;

    tracing::info!(request_id = %request_id, device_id = %device_id, "Reset daily quota");

    Ok(Json(quota.into()))
}
