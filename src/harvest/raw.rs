//! Scraper output and its conversion into observations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::StatsResult,
    models::{
        observation::parse_metric, Granularity, HarvestTask, Observation, RankingAlgorithm,
        RecencyWindow, MAX_RANK,
    },
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// One listing entry as the page exposes it. Every attribute may be missing.
/// Metrics usually arrive as text; a value that is not an integer is unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub title: Option<String>,
    /// Stable post id, e.g. `t3_1ky2rld`.
    #[serde(default)]
    pub data_ks_id: Option<String>,
    #[serde(default)]
    pub perma_link_path: Option<String>,
    #[serde(default)]
    pub subreddit_id: Option<String>,
    #[serde(default)]
    pub subreddit_prefix_name: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, rename = "author")]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub score: Option<i32>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub comment_count: Option<i32>,
    /// Zero-based position on the listing page.
    pub index: i64,
}

/// The ranking view a harvest run samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestTarget {
    pub subject_name: String,
    pub ranking_algorithm: RankingAlgorithm,
    pub recency_window: RecencyWindow,
    pub granularity: Granularity,
}

impl From<&HarvestTask> for HarvestTarget {
    fn from(task: &HarvestTask) -> Self {
        Self {
            subject_name: task.subject_name.clone(),
            ranking_algorithm: task.ranking_algorithm,
            recency_window: task.recency_window,
            granularity: task.interval,
        }
    }
}

fn lenient_metric<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) => parse_metric(&raw),
        Value::Number(number) => number.as_i64().and_then(|v| i32::try_from(v).ok()),
        _ => None,
    })
}

pub fn parse_raw_posts(bytes: &[u8]) -> Result<Vec<RawPost>> {
    serde_json::from_slice(bytes).context("harvester output is not a JSON array of posts")
}

fn strip_subject_prefix(prefixed: &str) -> &str {
    let trimmed = prefixed.trim();
    trimmed.strip_prefix("r/").unwrap_or(trimmed)
}

/// Converts one harvest's posts into observations bucketed at `polled_at`.
///
/// Posts without an id or outside the top `MAX_RANK` are dropped.
pub fn into_observations(
    posts: Vec<RawPost>,
    target: &HarvestTarget,
    polled_at: DateTime<Utc>,
) -> StatsResult<Vec<Observation>> {
    let bucket_time = target.granularity.align(polled_at)?;

    let mut observations = Vec::with_capacity(posts.len());
    for post in posts {
        let item_id = post.data_ks_id.unwrap_or_default().trim().to_string();
        if item_id.is_empty() {
            log_warn!("dropping post at index {} without an id", post.index);
            continue;
        }

        let rank = match post.index.checked_add(1).and_then(|r| i32::try_from(r).ok()) {
            Some(rank) if (1..=MAX_RANK).contains(&rank) => rank,
            _ => {
                log_warn!("dropping {item_id}: index {} is outside the top {MAX_RANK}", post.index);
                continue;
            }
        };

        let subject_name = post
            .subreddit_prefix_name
            .as_deref()
            .map(strip_subject_prefix)
            .filter(|name| !name.is_empty())
            .unwrap_or(target.subject_name.as_str())
            .to_string();

        observations.push(Observation {
            id: None,
            item_id,
            bucket_time,
            polled_at,
            rank,
            score: post.score,
            comment_count: post.comment_count,
            title: post.title.unwrap_or_default(),
            permalink: post.perma_link_path.unwrap_or_default(),
            subject_id: post.subreddit_id.unwrap_or_default(),
            subject_name,
            author_id: post.author_id.unwrap_or_default(),
            author_name: post.author_name.unwrap_or_default(),
            ranking_algorithm: target.ranking_algorithm,
            recency_window: target.recency_window,
            granularity: target.granularity,
        });
    }

    Ok(observations)
}
