use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::catalog::Catalog;
use crate::models::HistoryEntry;

pub const DEFAULT_RECENCY_DAYS: i64 = 7;

/// Catalog ids of menus recommended within `window` before `now`
///
/// History only records display names, so each entry is mapped back through
/// the catalog; names the catalog no longer knows are skipped.
pub fn recent_item_ids(
    history: &[HistoryEntry],
    catalog: &Catalog,
    now: DateTime<Utc>,
    window: Duration,
) -> HashSet<String> {
    let cutoff = now - window;

    history
        .iter()
        .filter(|entry| entry.created_at >= cutoff)
        .filter_map(|entry| catalog.find_by_name(&entry.item_name))
        .map(|item| item.id.clone())
        .collect()
}
