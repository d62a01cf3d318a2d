use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::services::recency::DEFAULT_RECENCY_DAYS;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL. Device state is kept in memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// JSON menu catalog. The built-in catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Number of alternatives returned with each pick
    #[serde(default = "default_alternates")]
    pub alternates: usize,

    /// Days of history that count as recently recommended
    #[serde(default = "default_recency_days")]
    pub recency_days: i64,

    /// Offset of the zone that decides where a day starts
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_alternates() -> usize {
    5
}

fn default_recency_days() -> i64 {
    DEFAULT_RECENCY_DAYS
}

/// Upper bound on the recency window, keeping `now - window` representable
pub const MAX_RECENCY_DAYS: i64 = 3_650;

fn default_utc_offset_minutes() -> i32 {
    540
}

/// The knobs the recommendation flow reads on every call
#[derive(Debug, Clone, Copy)]
pub struct RecommendSettings {
    pub alternates: usize,
    pub recency_window: Duration,
    pub utc_offset: FixedOffset,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            alternates: default_alternates(),
            recency_window: Duration::days(DEFAULT_RECENCY_DAYS),
            utc_offset: FixedOffset::east_opt(default_utc_offset_minutes() * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn recommend_settings(&self) -> anyhow::Result<RecommendSettings> {
        if self.recency_days < 0 {
            anyhow::bail!("RECENCY_DAYS must not be negative, got {}", self.recency_days);
        }
        if self.recency_days > MAX_RECENCY_DAYS {
            anyhow::bail!(
                "RECENCY_DAYS must be at most {}, got {}",
                MAX_RECENCY_DAYS,
                self.recency_days
            );
        }

        let utc_offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!(
                "UTC_OFFSET_MINUTES out of range: {}",
                self.utc_offset_minutes
            )
        })?;

        Ok(RecommendSettings {
            alternates: self.alternates,
            recency_window: Duration::days(self.recency_days),
            utc_offset,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
