use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::SeriesPoint;

const HEADER: [&str; 17] = [
    "row",
    "polled_at",
    "bucket_time",
    "rank",
    "ranking_algorithm",
    "recency_window",
    "item_id",
    "title",
    "permalink",
    "comment_count",
    "score",
    "subject_id",
    "subject_name",
    "author_id",
    "author_name",
    "synthetic",
    "gap",
];

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the series as a comma-separated table with a header row. Missing
/// values are empty cells.
pub fn write_table<W: Write>(points: &[SeriesPoint], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;

    for (position, point) in points.iter().enumerate() {
        writer
            .write_record([
                (position + 1).to_string(),
                cell(point.polled_at.map(timestamp)),
                timestamp(point.bucket_time),
                cell(point.rank),
                cell(point.ranking_algorithm),
                cell(point.recency_window),
                point.item_id.clone(),
                point.title.clone(),
                point.permalink.clone(),
                cell(point.comment_count),
                cell(point.score),
                point.subject_id.clone(),
                point.subject_name.clone(),
                point.author_id.clone(),
                point.author_name.clone(),
                point.synthetic.to_string(),
                cell(point.gap.map(|gap| gap.as_str())),
            ])
            .with_context(|| format!("failed to write row {}", position + 1))?;
    }

    writer.flush().context("failed to flush table")?;
    Ok(())
}
