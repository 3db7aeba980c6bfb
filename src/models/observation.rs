//! Raw observations and reconciled series points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ranking::{Granularity, RankingAlgorithm, RecencyWindow};

/// Ranks are captured from the first page of a listing.
pub const MAX_RANK: i32 = 20;

/// Parses a scraped metric. Anything that is not a plain integer is unknown.
pub fn parse_metric(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// One sample of one item at one aligned bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub id: Option<i64>,
    pub item_id: String,
    pub bucket_time: DateTime<Utc>,
    pub polled_at: DateTime<Utc>,
    pub rank: i32,
    pub score: Option<i32>,
    pub comment_count: Option<i32>,
    pub title: String,
    pub permalink: String,
    pub subject_id: String,
    pub subject_name: String,
    pub author_id: String,
    pub author_name: String,
    pub ranking_algorithm: RankingAlgorithm,
    pub recency_window: RecencyWindow,
    pub granularity: Granularity,
}

/// Why a synthetic point was inserted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// The bucket was polled but the item was not in the captured top-K.
    ItemDropout,
    /// Nothing at all was captured for the bucket.
    PollFailure,
}

impl GapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapKind::ItemDropout => "item_dropout",
            GapKind::PollFailure => "poll_failure",
        }
    }
}

/// One row of a reconciled series. Null metrics mean no real observation
/// backs the point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub item_id: String,
    pub bucket_time: DateTime<Utc>,
    pub polled_at: Option<DateTime<Utc>>,
    pub rank: Option<i32>,
    pub score: Option<i32>,
    pub comment_count: Option<i32>,
    pub title: String,
    pub permalink: String,
    pub subject_id: String,
    pub subject_name: String,
    pub author_id: String,
    pub author_name: String,
    pub ranking_algorithm: Option<RankingAlgorithm>,
    pub recency_window: Option<RecencyWindow>,
    pub synthetic: bool,
    pub gap: Option<GapKind>,
}

impl SeriesPoint {
    pub fn observed(observation: &Observation) -> Self {
        Self {
            item_id: observation.item_id.clone(),
            bucket_time: observation.bucket_time,
            polled_at: Some(observation.polled_at),
            rank: Some(observation.rank),
            score: observation.score,
            comment_count: observation.comment_count,
            title: observation.title.clone(),
            permalink: observation.permalink.clone(),
            subject_id: observation.subject_id.clone(),
            subject_name: observation.subject_name.clone(),
            author_id: observation.author_id.clone(),
            author_name: observation.author_name.clone(),
            ranking_algorithm: Some(observation.ranking_algorithm),
            recency_window: Some(observation.recency_window),
            synthetic: false,
            gap: None,
        }
    }

    /// Filler for a polled bucket the item was missing from. Descriptive
    /// fields are borrowed from `donor`, a real observation of the same item.
    pub fn item_dropout(donor: &Observation, bucket_time: DateTime<Utc>) -> Self {
        Self {
            bucket_time,
            polled_at: None,
            rank: None,
            score: None,
            comment_count: None,
            synthetic: true,
            gap: Some(GapKind::ItemDropout),
            ..Self::observed(donor)
        }
    }

    /// Filler for a bucket with no observations at all. Only the item's own
    /// identity survives; subject, author and ranking view are left blank.
    pub fn poll_failure(donor: &Observation, bucket_time: DateTime<Utc>) -> Self {
        Self {
            item_id: donor.item_id.clone(),
            bucket_time,
            polled_at: None,
            rank: None,
            score: None,
            comment_count: None,
            title: donor.title.clone(),
            permalink: donor.permalink.clone(),
            subject_id: String::new(),
            subject_name: String::new(),
            author_id: String::new(),
            author_name: String::new(),
            ranking_algorithm: None,
            recency_window: None,
            synthetic: true,
            gap: Some(GapKind::PollFailure),
        }
    }
}
