use log::info;

use crate::{
    db::{Database, ObservationQuery},
    error::{StatsError, StatsResult},
    models::SeriesPoint,
    series::{reconcile::reconcile, request::SeriesRequest},
};

/// Reads the raw observations for `request` and reconciles them.
///
/// The request is validated before the store is touched; store failures come
/// back as `StatsError::Storage` with the original error chain.
pub async fn load_series(db: &Database, request: &SeriesRequest) -> StatsResult<Vec<SeriesPoint>> {
    request.validate()?;

    let query = ObservationQuery::from(request);
    let observations = db
        .query_observations(&query)
        .await
        .map_err(StatsError::Storage)?;

    let raw_count = observations.len();
    let points = reconcile(request, observations)?;

    info!(
        "series subject={} algorithm={} window={} backfill={} raw={} points={}",
        request.subject_name,
        request.ranking_algorithm,
        request.recency_window,
        request.backfill,
        raw_count,
        points.len()
    );

    Ok(points)
}
