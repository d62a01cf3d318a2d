use std::collections::HashMap;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    db::{KeyValueStore, StoreError, StoreKey},
    models::{history::push_history, FavoriteSet, HistoryEntry},
    services::quota::DailyQuotaState,
};

/// Typed access to one device's persisted state
///
/// Reads never fail: a missing, unreadable or corrupt value comes back as
/// absent and is logged. Writes report their errors.
#[derive(Clone)]
pub struct DeviceStore {
    store: Arc<dyn KeyValueStore>,
}

impl DeviceStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &StoreKey) -> Option<T> {
        let bytes = match self.store.get(&key.to_string()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Store read failed, treating value as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable stored value");
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, key: &StoreKey, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(&key.to_string(), bytes).await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "Store write failed");
            e
        })
    }

    /// Today's quota state as stored, upgraded to the current schema
    pub async fn load_today(&self, device_id: &str) -> Option<DailyQuotaState> {
        let mut state: DailyQuotaState = self
            .read_json(&StoreKey::Today(device_id.to_string()))
            .await?;

        if state.migrate() {
            tracing::info!(device_id = %device_id, "Migrated stored daily state");
        }

        Some(state)
    }

    pub async fn save_today(
        &self,
        device_id: &str,
        state: &DailyQuotaState,
    ) -> Result<(), StoreError> {
        self.write_json(&StoreKey::Today(device_id.to_string()), state)
            .await
    }

    /// Newest first
    pub async fn load_history(&self, device_id: &str) -> Vec<HistoryEntry> {
        self.read_json(&StoreKey::History(device_id.to_string()))
            .await
            .unwrap_or_default()
    }

    /// Prepends `entry` and returns the stored, capped history
    pub async fn append_history(
        &self,
        device_id: &str,
        entry: HistoryEntry,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut history = self.load_history(device_id).await;
        push_history(&mut history, entry);
        self.write_json(&StoreKey::History(device_id.to_string()), &history)
            .await?;
        Ok(history)
    }

    pub async fn clear_history(&self, device_id: &str) -> Result<(), StoreError> {
        self.store
            .delete(&StoreKey::History(device_id.to_string()).to_string())
            .await
    }

    pub async fn load_favorites(&self, device_id: &str) -> FavoriteSet {
        let ids: Vec<String> = self
            .read_json(&StoreKey::Favorites(device_id.to_string()))
            .await
            .unwrap_or_default();
        FavoriteSet::from_ids(ids)
    }

    pub async fn save_favorites(
        &self,
        device_id: &str,
        favorites: &FavoriteSet,
    ) -> Result<(), StoreError> {
        self.write_json(&StoreKey::Favorites(device_id.to_string()), favorites)
            .await
    }
}

/// One async lock per device, so read-modify-write cycles on a device's
/// state never interleave
#[derive(Default)]
pub struct DeviceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DeviceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks `device_id`, waiting for any cycle already running on it
    ///
    /// Entries nobody holds or waits on are dropped on the way in, so the map
    /// only tracks devices with a cycle in flight.
    pub async fn acquire(&self, device_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(device_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
