use serde::{Deserialize, Serialize};

use crate::models::Recommendation;

/// Current layout of the persisted daily state
pub const SCHEMA_VERSION: u32 = 1;
/// Recommendations allowed per day and request signature
pub const MAX_ATTEMPTS: u32 = 4;

fn default_max_attempts() -> u32 {
    MAX_ATTEMPTS
}

/// Per-day, per-signature progress record
///
/// Lifecycle: EMPTY, then ACTIVE after each successful recommendation, then
/// EXHAUSTED once `attempt == max_attempts`. A different date key or
/// signature discards the record entirely; nothing is carried over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyQuotaState {
    /// Absent in records written before versioning; treated as 0
    #[serde(default)]
    pub schema_version: u32,
    pub date_key: String,
    #[serde(default)]
    pub attempt: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub signature: String,
    /// Every menu id shown today for this signature, newest first
    #[serde(default)]
    pub used_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl DailyQuotaState {
    pub fn empty(date_key: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            date_key: date_key.into(),
            attempt: 0,
            max_attempts: MAX_ATTEMPTS,
            signature: signature.into(),
            used_ids: Vec::new(),
            recommendation: None,
        }
    }

    /// Upgrades an older record in place. Missing fields were already filled
    /// with their defaults during deserialization. Returns whether anything changed.
    pub fn migrate(&mut self) -> bool {
        if self.schema_version == SCHEMA_VERSION {
            return false;
        }

        self.schema_version = SCHEMA_VERSION;
        if self.max_attempts == 0 {
            self.max_attempts = MAX_ATTEMPTS;
        }
        true
    }

    pub fn is_current(&self, date_key: &str, signature: &str) -> bool {
        self.date_key == date_key && self.signature == signature
    }

    /// Returns the stored state if it still applies to `(date_key, signature)`,
    /// otherwise a fresh EMPTY one. The flag reports whether a reset happened.
    pub fn resolve(stored: Option<Self>, date_key: &str, signature: &str) -> (Self, bool) {
        match stored {
            Some(mut state) if state.is_current(date_key, signature) => {
                state.migrate();
                (state, false)
            }
            _ => (Self::empty(date_key, signature), true),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }

    /// Applies a successful recommendation: one more attempt, the pick joins
    /// the used ids, and the stored result is replaced.
    pub(crate) fn record(&mut self, recommendation: Recommendation) {
        self.attempt = (self.attempt + 1).min(self.max_attempts);
        self.date_key = recommendation.date_key.clone();
        self.used_ids = recommendation.used_ids.clone();
        self.recommendation = Some(recommendation);
    }

    /// Back to EMPTY for the same day and signature
    pub fn reset(&mut self) {
        let date_key = std::mem::take(&mut self.date_key);
        let signature = std::mem::take(&mut self.signature);
        *self = Self::empty(date_key, signature);
    }
}
