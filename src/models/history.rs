use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MealTime, Recommendation};

/// Maximum number of history entries kept per device
pub const HISTORY_MAX: usize = 80;
/// Maximum number of favorite menu ids kept per device
pub const FAVORITES_MAX: usize = 40;

/// One issued recommendation, as recorded in the device's history feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub date_key: String,
    pub meal_time: MealTime,
    pub people: u32,
    pub item_name: String,
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub attempt: u32,
}

impl HistoryEntry {
    pub fn from_recommendation(recommendation: &Recommendation) -> Self {
        Self {
            id: format!(
                "{}-{}",
                recommendation.date_key,
                recommendation.created_at.timestamp_millis()
            ),
            date_key: recommendation.date_key.clone(),
            meal_time: recommendation.input.meal_time,
            people: recommendation.input.people,
            item_name: recommendation.picked.name.clone(),
            score: recommendation.score,
            reasons: recommendation.reasons.clone(),
            created_at: recommendation.created_at,
            attempt: recommendation.attempt,
        }
    }
}

/// Prepends `entry`, evicting the oldest entries beyond [`HISTORY_MAX`]
pub fn push_history(history: &mut Vec<HistoryEntry>, entry: HistoryEntry) {
    history.insert(0, entry);
    history.truncate(HISTORY_MAX);
}

/// Favorite menu ids, de-duplicated in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FavoriteSet {
    ids: Vec<String>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from stored ids; duplicates collapse onto their first
    /// position and anything past [`FAVORITES_MAX`] is dropped.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut set = Self::new();
        for id in ids {
            if !set.ids.contains(&id) {
                set.ids.push(id);
            }
        }
        set.ids.truncate(FAVORITES_MAX);
        set
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Adds `id` if absent; returns false when the set is already full
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return true;
        }
        if self.ids.len() >= FAVORITES_MAX {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        before != self.ids.len()
    }

    /// Flips membership of `id` and reports whether it is a favorite afterwards
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.remove(id) {
            false
        } else {
            self.insert(id)
        }
    }
}
