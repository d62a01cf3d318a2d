use std::collections::HashMap;

use serde::Serialize;

use crate::{catalog::Catalog, models::HistoryEntry};

const TOP_N: usize = 4;
const UNKNOWN_CUISINE: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Aggregates over a device's recommendation history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsOverview {
    pub total_count: usize,
    pub avg_people: f64,
    pub avg_score: f64,
    pub top_cuisines: Vec<LabelCount>,
    pub top_meal_times: Vec<LabelCount>,
}

/// Counts labels, most frequent first, ties broken alphabetically
fn top_by_count<I>(labels: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        let label = match label.trim() {
            "" => UNKNOWN_CUISINE.to_string(),
            trimmed => trimmed.to_string(),
        };
        *counts.entry(label).or_default() += 1;
    }

    let mut ranked: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranked.truncate(TOP_N);
    ranked
}

pub fn overview(history: &[HistoryEntry], catalog: &Catalog) -> StatsOverview {
    let total_count = history.len();

    let (avg_people, avg_score) = if total_count == 0 {
        (0.0, 0.0)
    } else {
        let people: u32 = history.iter().map(|entry| entry.people).sum();
        let score: f64 = history.iter().map(|entry| entry.score).sum();
        (
            f64::from(people) / total_count as f64,
            score / total_count as f64,
        )
    };

    let top_cuisines = top_by_count(history.iter().map(|entry| {
        catalog
            .find_by_name(&entry.item_name)
            .map(|item| item.cuisine.clone())
            .unwrap_or_else(|| UNKNOWN_CUISINE.to_string())
    }));

    let top_meal_times = top_by_count(
        history
            .iter()
            .map(|entry| entry.meal_time.as_str().to_string()),
    );

    StatsOverview {
        total_count,
        avg_people,
        avg_score,
        top_cuisines,
        top_meal_times,
    }
}
