use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_enum},
};
use crate::models::{Granularity, HarvestTask, HarvestTaskInput};

fn row_to_task(row: &Row) -> Result<HarvestTask> {
    let interval: String = row.get("interval")?;
    let ranking_algorithm: String = row.get("ranking_algorithm")?;
    let recency_window: String = row.get("recency_window")?;
    let created_at: String = row.get("created_at")?;

    Ok(HarvestTask {
        id: row.get("id")?,
        subject_name: row.get("subject_name")?,
        min_item_count: row.get("min_item_count")?,
        interval: parse_enum(&interval, "interval")?,
        ranking_algorithm: parse_enum(&ranking_algorithm, "ranking_algorithm")?,
        recency_window: parse_enum(&recency_window, "recency_window")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Register a harvest task and return the stored row
    pub async fn create_task(&self, input: HarvestTaskInput) -> Result<HarvestTask> {
        self.execute(move |conn| {
            let now = Utc::now();

            conn.execute(
                "INSERT INTO harvest_tasks (subject_name, min_item_count, interval, ranking_algorithm, recency_window, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.subject_name,
                    input.min_item_count,
                    input.interval.as_str(),
                    input.ranking_algorithm.as_str(),
                    input.recency_window.as_str(),
                    format_datetime(&now),
                ],
            )?;

            let task_id = conn.last_insert_rowid();

            let mut stmt = conn.prepare(
                "SELECT id, subject_name, min_item_count, interval, ranking_algorithm, recency_window, created_at
                 FROM harvest_tasks
                 WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![task_id])?;
            let task = match rows.next()? {
                Some(row) => row_to_task(row)?,
                None => return Err(anyhow!("Task not found after insert")),
            };

            Ok(task)
        })
        .await
    }

    /// Remove a task. Returns false when no task had that id.
    pub async fn delete_task(&self, task_id: i64) -> Result<bool> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM harvest_tasks WHERE id = ?1", params![task_id])?;
            Ok(rows_affected > 0)
        })
        .await
    }

    pub async fn list_tasks(&self) -> Result<Vec<HarvestTask>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_name, min_item_count, interval, ranking_algorithm, recency_window, created_at
                 FROM harvest_tasks
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }

            Ok(tasks)
        })
        .await
    }

    /// Tasks that run on the given interval
    pub async fn tasks_by_interval(&self, interval: Granularity) -> Result<Vec<HarvestTask>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, subject_name, min_item_count, interval, ranking_algorithm, recency_window, created_at
                 FROM harvest_tasks
                 WHERE interval = ?1
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query(params![interval.as_str()])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }

            Ok(tasks)
        })
        .await
    }
}
