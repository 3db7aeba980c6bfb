use crate::{
    db::Database,
    error::{StatsError, StatsResult},
    models::{Granularity, HarvestTask, HarvestTaskInput},
};

/// Checks a task before it is registered. Only hourly harvesting is scheduled.
pub fn validate_task(input: &HarvestTaskInput) -> StatsResult<()> {
    if input.subject_name.trim().is_empty() {
        return Err(StatsError::validation("subject_name is empty"));
    }
    if input.min_item_count <= 0 {
        return Err(StatsError::validation(format!(
            "min_item_count must be positive, got {}",
            input.min_item_count
        )));
    }
    if input.interval != Granularity::Hour {
        return Err(StatsError::UnsupportedGranularity(
            input.interval.as_str().to_string(),
        ));
    }
    Ok(())
}

pub async fn create_task(db: &Database, mut input: HarvestTaskInput) -> StatsResult<HarvestTask> {
    validate_task(&input)?;
    input.subject_name = input.subject_name.trim().to_string();
    db.create_task(input).await.map_err(StatsError::Storage)
}

pub async fn delete_task(db: &Database, task_id: i64) -> StatsResult<()> {
    let removed = db.delete_task(task_id).await.map_err(StatsError::Storage)?;
    if !removed {
        return Err(StatsError::validation(format!("no task with id {task_id}")));
    }
    Ok(())
}

pub async fn list_tasks(db: &Database) -> StatsResult<Vec<HarvestTask>> {
    db.list_tasks().await.map_err(StatsError::Storage)
}
