use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::error;
use rusqlite::{params, Row};
use tokio::task::JoinSet;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, lenient_metric, parse_datetime, parse_enum},
};
use crate::models::{Granularity, Observation, RankingAlgorithm, RecencyWindow};
use crate::series::SeriesRequest;

/// Range query over one ranking view of one subject. `to_time` is exclusive.
#[derive(Debug, Clone)]
pub struct ObservationQuery {
    pub subject_name: String,
    pub ranking_algorithm: RankingAlgorithm,
    pub recency_window: RecencyWindow,
    pub granularity: Granularity,
    pub from_time: DateTime<Utc>,
    pub to_time: DateTime<Utc>,
}

impl From<&SeriesRequest> for ObservationQuery {
    fn from(request: &SeriesRequest) -> Self {
        Self {
            subject_name: request.subject_name.trim().to_string(),
            ranking_algorithm: request.ranking_algorithm,
            recency_window: request.recency_window,
            granularity: request.granularity,
            from_time: request.from_time,
            to_time: request.to_time,
        }
    }
}

fn row_to_observation(row: &Row) -> Result<Observation> {
    let bucket_time: String = row.get("bucket_time")?;
    let polled_at: String = row.get("polled_at")?;
    let ranking_algorithm: String = row.get("ranking_algorithm")?;
    let recency_window: String = row.get("recency_window")?;
    let granularity: String = row.get("granularity")?;

    Ok(Observation {
        id: row.get("id")?,
        item_id: row.get("item_id")?,
        bucket_time: parse_datetime(&bucket_time, "bucket_time")?,
        polled_at: parse_datetime(&polled_at, "polled_at")?,
        rank: row.get("rank")?,
        score: lenient_metric(row, "score")?,
        comment_count: lenient_metric(row, "comment_count")?,
        title: row.get("title")?,
        permalink: row.get("permalink")?,
        subject_id: row.get("subject_id")?,
        subject_name: row.get("subject_name")?,
        author_id: row.get("author_id")?,
        author_name: row.get("author_name")?,
        ranking_algorithm: parse_enum(&ranking_algorithm, "ranking_algorithm")?,
        recency_window: parse_enum(&recency_window, "recency_window")?,
        granularity: parse_enum(&granularity, "granularity")?,
    })
}

impl Database {
    /// Stores one observation. A second sample of the same item in the same
    /// bucket and ranking view replaces the first.
    pub async fn insert_observation(&self, observation: &Observation) -> Result<()> {
        let record = observation.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO observations (
                    item_id,
                    bucket_time,
                    polled_at,
                    rank,
                    score,
                    comment_count,
                    title,
                    permalink,
                    subject_id,
                    subject_name,
                    author_id,
                    author_name,
                    ranking_algorithm,
                    recency_window,
                    granularity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                ON CONFLICT (item_id, bucket_time, ranking_algorithm, recency_window, granularity)
                DO UPDATE SET
                    polled_at = excluded.polled_at,
                    rank = excluded.rank,
                    score = excluded.score,
                    comment_count = excluded.comment_count,
                    title = excluded.title,
                    permalink = excluded.permalink,
                    subject_id = excluded.subject_id,
                    subject_name = excluded.subject_name,
                    author_id = excluded.author_id,
                    author_name = excluded.author_name",
                params![
                    record.item_id,
                    format_datetime(&record.bucket_time),
                    format_datetime(&record.polled_at),
                    record.rank,
                    record.score,
                    record.comment_count,
                    record.title,
                    record.permalink,
                    record.subject_id,
                    record.subject_name,
                    record.author_id,
                    record.author_name,
                    record.ranking_algorithm.as_str(),
                    record.recency_window.as_str(),
                    record.granularity.as_str(),
                ],
            )
            .with_context(|| {
                format!(
                    "failed to insert observation item={} bucket={}",
                    record.item_id,
                    format_datetime(&record.bucket_time)
                )
            })?;
            Ok(())
        })
        .await
    }

    /// Inserts every observation independently. Failures are logged and do
    /// not stop the other inserts. Returns how many were stored.
    pub async fn insert_observations(&self, observations: Vec<Observation>) -> usize {
        let mut inserts = JoinSet::new();
        for observation in observations {
            let db = self.clone();
            inserts.spawn(async move { db.insert_observation(&observation).await });
        }

        let mut stored = 0;
        while let Some(joined) = inserts.join_next().await {
            match joined {
                Ok(Ok(())) => stored += 1,
                Ok(Err(err)) => error!("{err:#}"),
                Err(join_err) => error!("observation insert task failed: {join_err}"),
            }
        }
        stored
    }

    /// Raw observations for one ranking view in `[from_time, to_time)`, in
    /// ingestion order.
    pub async fn query_observations(&self, query: &ObservationQuery) -> Result<Vec<Observation>> {
        let query = query.clone();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    id,
                    item_id,
                    bucket_time,
                    polled_at,
                    rank,
                    score,
                    comment_count,
                    title,
                    permalink,
                    subject_id,
                    subject_name,
                    author_id,
                    author_name,
                    ranking_algorithm,
                    recency_window,
                    granularity
                FROM observations
                WHERE subject_name = ?1
                  AND ranking_algorithm = ?2
                  AND recency_window = ?3
                  AND granularity = ?4
                  AND bucket_time >= ?5
                  AND bucket_time < ?6
                ORDER BY id ASC",
            )?;

            let mut rows = stmt.query(params![
                query.subject_name,
                query.ranking_algorithm.as_str(),
                query.recency_window.as_str(),
                query.granularity.as_str(),
                format_datetime(&query.from_time),
                format_datetime(&query.to_time),
            ])?;

            let mut observations = Vec::new();
            while let Some(row) = rows.next()? {
                observations.push(row_to_observation(row)?);
            }

            Ok(observations)
        })
        .await
    }
}
