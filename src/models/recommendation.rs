use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MenuItem, RecommendRequest};

/// The outcome of one successful recommendation, stored inside today's quota state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub date_key: String,
    pub picked: MenuItem,
    /// Never contains `picked`
    pub alternatives: Vec<MenuItem>,
    pub score: f64,
    /// At most three, in evaluation order
    pub reasons: Vec<String>,
    pub attempt: u32,
    /// Every id shown today, including `picked`
    pub used_ids: Vec<String>,
    pub signature: String,
    pub created_at: DateTime<Utc>,
    pub input: RecommendRequest,
}
