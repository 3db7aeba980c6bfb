//! Harvest task registry models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ranking::{Granularity, RankingAlgorithm, RecencyWindow};

/// A subject that is harvested on a fixed interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestTask {
    pub id: i64,
    pub subject_name: String,
    pub min_item_count: i64,
    pub interval: Granularity,
    pub ranking_algorithm: RankingAlgorithm,
    pub recency_window: RecencyWindow,
    pub created_at: DateTime<Utc>,
}

/// Input data for registering a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestTaskInput {
    pub subject_name: String,
    pub min_item_count: i64,
    pub interval: Granularity,
    pub ranking_algorithm: RankingAlgorithm,
    pub recency_window: RecencyWindow,
}
