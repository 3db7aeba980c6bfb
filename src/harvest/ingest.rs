use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::db::Database;

use super::raw::{into_observations, parse_raw_posts, HarvestTarget, RawPost};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Converts a harvest into observations and stores them. Returns the number
/// of observations written.
pub async fn ingest_posts(
    db: &Database,
    posts: Vec<RawPost>,
    target: &HarvestTarget,
    polled_at: DateTime<Utc>,
) -> Result<usize> {
    let received = posts.len();
    let observations = into_observations(posts, target, polled_at)?;
    let converted = observations.len();
    let stored = db.insert_observations(observations).await;

    log_info!(
        "ingested subject={} algorithm={} window={} received={} converted={} stored={}",
        target.subject_name,
        target.ranking_algorithm,
        target.recency_window,
        received,
        converted,
        stored
    );

    Ok(stored)
}

/// Loads a saved scraper dump and ingests it as if it had been harvested at
/// `polled_at`.
pub async fn ingest_file(
    db: &Database,
    path: &Path,
    target: &HarvestTarget,
    polled_at: DateTime<Utc>,
) -> Result<usize> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read harvest dump {}", path.display()))?;
    let posts = parse_raw_posts(&bytes)
        .with_context(|| format!("failed to parse harvest dump {}", path.display()))?;
    ingest_posts(db, posts, target, polled_at).await
}
