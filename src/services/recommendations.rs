use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::{
    catalog::Catalog,
    models::{MenuItem, Recommendation, RecommendRequest},
    services::{
        ladder::{self, PoolInfo, StageName},
        quota::DailyQuotaState,
    },
};

/// Why a recommendation could not be produced. None of these are fatal.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    #[error("All {max_attempts} recommendations for today have been used")]
    QuotaExhausted { max_attempts: u32 },

    #[error("No menu matches the selected conditions")]
    NoCandidates,

    #[error("The menu catalog is empty")]
    EmptyCatalog,
}

/// A successful recommendation and how it was reached
#[derive(Debug, Clone, Serialize)]
pub struct RecommendOutcome {
    pub recommendation: Recommendation,
    pub stage: StageName,
    pub explanation: String,
}

/// Calendar day key (`YYYY-MM-DD`) in the caller's local offset
pub fn date_key(now: &DateTime<FixedOffset>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Picks one menu for `request` and advances today's quota state
///
/// `state` is only written on success. A stored state for another day or
/// signature is treated as EMPTY rather than continued. The caller persists
/// the updated state and appends the history entry.
pub fn recommend(
    catalog: &Catalog,
    request: &RecommendRequest,
    state: &mut DailyQuotaState,
    recent_ids: &HashSet<String>,
    alternates: usize,
    now: DateTime<FixedOffset>,
) -> Result<RecommendOutcome, RecommendError> {
    let today = date_key(&now);
    let signature = request.signature();

    let (mut next, _) = DailyQuotaState::resolve(Some(state.clone()), &today, &signature);

    if next.is_exhausted() {
        return Err(RecommendError::QuotaExhausted {
            max_attempts: next.max_attempts,
        });
    }

    if catalog.is_empty() {
        return Err(RecommendError::EmptyCatalog);
    }

    let used: HashSet<String> = next.used_ids.iter().cloned().collect();

    let outcome = ladder::run_ladder(catalog.items(), request, &used, recent_ids)
        .ok_or(RecommendError::NoCandidates)?;

    let Some(picked) = outcome.candidates.first() else {
        return Err(RecommendError::NoCandidates);
    };

    let alternatives: Vec<MenuItem> = outcome
        .candidates
        .iter()
        .skip(1)
        .take(alternates)
        .filter(|candidate| candidate.item.id != picked.item.id)
        .map(|candidate| candidate.item.clone())
        .collect();

    let mut used_ids = vec![picked.item.id.clone()];
    used_ids.extend(
        next.used_ids
            .iter()
            .filter(|id| **id != picked.item.id)
            .cloned(),
    );

    let recommendation = Recommendation {
        date_key: today,
        picked: picked.item.clone(),
        alternatives,
        score: picked.score,
        reasons: picked.reasons.clone(),
        attempt: next.attempt + 1,
        used_ids,
        signature,
        created_at: now.with_timezone(&Utc),
        input: request.clone(),
    };

    next.record(recommendation.clone());
    *state = next;

    tracing::info!(
        menu_id = %recommendation.picked.id,
        stage = ?outcome.stage.name,
        score = recommendation.score,
        attempt = recommendation.attempt,
        alternatives = recommendation.alternatives.len(),
        "Recommendation issued"
    );

    Ok(RecommendOutcome {
        recommendation,
        stage: outcome.stage.name,
        explanation: outcome.explanation,
    })
}

/// Read-only preview of the candidate pool per stage for today's state
pub fn recommendation_pool(
    catalog: &Catalog,
    request: &RecommendRequest,
    state: &DailyQuotaState,
    recent_ids: &HashSet<String>,
    now: DateTime<FixedOffset>,
) -> PoolInfo {
    let used: HashSet<String> = if state.is_current(&date_key(&now), &request.signature()) {
        state.used_ids.iter().cloned().collect()
    } else {
        HashSet::new()
    };

    ladder::pool_info(catalog.items(), request, &used, recent_ids)
}
