use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::{
    task::JoinSet,
    time::{Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    db::Database,
    models::{Granularity, HarvestTask},
};

use super::{command::Harvester, ingest::ingest_posts, raw::HarvestTarget};

// Set to false to silence per-task harvest logging
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy)]
pub struct HarvestSchedule {
    pub every: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HarvestOutcome {
    Stored { count: usize },
    Failed { message: String },
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub task_id: i64,
    pub subject_name: String,
    pub outcome: HarvestOutcome,
}

/// Harvests one task and stores what came back.
pub async fn harvest_task<H: Harvester>(
    db: &Database,
    harvester: &H,
    task: &HarvestTask,
    timeout: Duration,
) -> HarvestOutcome {
    let target = HarvestTarget::from(task);
    let polled_at = Utc::now();

    let posts = match tokio::time::timeout(timeout, harvester.harvest(&target)).await {
        Ok(Ok(posts)) => posts,
        Ok(Err(err)) => {
            return HarvestOutcome::Failed {
                message: format!("{err:#}"),
            }
        }
        Err(_) => return HarvestOutcome::TimedOut,
    };

    if (posts.len() as i64) < task.min_item_count {
        log_warn!(
            "task {} ({}) returned {} posts, expected at least {}",
            task.id,
            task.subject_name,
            posts.len(),
            task.min_item_count
        );
    }

    match ingest_posts(db, posts, &target, polled_at).await {
        Ok(count) => HarvestOutcome::Stored { count },
        Err(err) => HarvestOutcome::Failed {
            message: format!("{err:#}"),
        },
    }
}

/// Runs every hourly task once, concurrently. A failing task does not affect
/// the others.
pub async fn harvest_once<H: Harvester>(
    db: &Database,
    harvester: Arc<H>,
    timeout: Duration,
) -> Result<Vec<HarvestReport>> {
    let run_id = Uuid::new_v4();
    let tasks = db.tasks_by_interval(Granularity::Hour).await?;
    log_info!("harvest run {run_id}: {} task(s)", tasks.len());

    let mut runs = JoinSet::new();
    for task in tasks {
        let db = db.clone();
        let harvester = Arc::clone(&harvester);
        runs.spawn(async move {
            let outcome = harvest_task(&db, harvester.as_ref(), &task, timeout).await;
            HarvestReport {
                task_id: task.id,
                subject_name: task.subject_name,
                outcome,
            }
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok(report) => {
                match &report.outcome {
                    HarvestOutcome::Stored { count } => {
                        log_info!(
                            "harvest run {run_id}: task {} ({}) stored {count}",
                            report.task_id,
                            report.subject_name
                        );
                    }
                    HarvestOutcome::Failed { message } => {
                        log_error!(
                            "harvest run {run_id}: task {} ({}) failed: {message}",
                            report.task_id,
                            report.subject_name
                        );
                    }
                    HarvestOutcome::TimedOut => {
                        log_warn!(
                            "harvest run {run_id}: task {} ({}) timed out (> {}ms)",
                            report.task_id,
                            report.subject_name,
                            timeout.as_millis()
                        );
                    }
                }
                reports.push(report);
            }
            Err(join_err) => {
                log_error!("harvest run {run_id}: task panicked: {join_err}");
            }
        }
    }

    reports.sort_by_key(|report| report.task_id);
    Ok(reports)
}

/// Harvests on every tick until cancelled.
pub async fn harvest_loop<H: Harvester>(
    db: Database,
    harvester: Arc<H>,
    schedule: HarvestSchedule,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(schedule.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = harvest_once(&db, Arc::clone(&harvester), schedule.timeout).await {
                    log_error!("harvest pass failed: {err:#}");
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("harvest loop shutting down");
                break;
            }
        }
    }
}
