use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    error::StatsResult,
    models::{Observation, SeriesPoint},
    series::request::SeriesRequest,
};

/// Observations of one item, at most one per bucket.
#[derive(Debug)]
struct ItemSeries {
    /// First observation seen for the item; lends its fields to fillers.
    donor: Observation,
    by_bucket: HashMap<DateTime<Utc>, Observation>,
}

impl ItemSeries {
    fn new(first: Observation) -> Self {
        let mut by_bucket = HashMap::new();
        by_bucket.insert(first.bucket_time, first.clone());
        Self {
            donor: first,
            by_bucket,
        }
    }
}

/// Main reconciliation function: turns raw observations into an ordered series.
///
/// The request is validated before the observations are looked at. Without
/// backfill every observation becomes exactly one real point. With backfill
/// the series is densified so that every item has one point per tick between
/// the first and last observed bucket.
pub fn reconcile(
    request: &SeriesRequest,
    observations: Vec<Observation>,
) -> StatsResult<Vec<SeriesPoint>> {
    let tick = request.validate()?;

    // Edge case: nothing harvested in range
    if observations.is_empty() {
        return Ok(Vec::new());
    }

    let mut points = if request.backfill {
        backfill(observations, tick)
    } else {
        observations.iter().map(SeriesPoint::observed).collect()
    };

    sort_points(&mut points);
    Ok(points)
}

fn backfill(observations: Vec<Observation>, tick: TimeDelta) -> Vec<SeriesPoint> {
    // Step 1: Group by item, last write wins per bucket
    let (items, observed) = group_by_item(observations);

    // Step 2: Time axis from the buckets actually seen
    let (Some(&first), Some(&last)) = (observed.first(), observed.last()) else {
        return Vec::new();
    };
    let grid = dense_grid(first, last, tick);

    let mut points = Vec::with_capacity(items.len() * grid.len().max(observed.len()));

    // Step 3: Item dropouts, scoped to polled buckets only
    for item in &items {
        for bucket in &observed {
            match item.by_bucket.get(bucket) {
                Some(observation) => points.push(SeriesPoint::observed(observation)),
                None => points.push(SeriesPoint::item_dropout(&item.donor, *bucket)),
            }
        }
    }

    // Step 4: Poll failures, every item once per unpolled tick
    for bucket in grid.into_iter().filter(|bucket| !observed.contains(bucket)) {
        for item in &items {
            points.push(SeriesPoint::poll_failure(&item.donor, bucket));
        }
    }

    points
}

/// Arena of per-item series in first-seen order, plus the set of observed buckets.
fn group_by_item(observations: Vec<Observation>) -> (Vec<ItemSeries>, BTreeSet<DateTime<Utc>>) {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<ItemSeries> = Vec::new();
    let mut observed = BTreeSet::new();

    for observation in observations {
        observed.insert(observation.bucket_time);
        match index.get(&observation.item_id) {
            Some(&slot) => {
                items[slot]
                    .by_bucket
                    .insert(observation.bucket_time, observation);
            }
            None => {
                index.insert(observation.item_id.clone(), items.len());
                items.push(ItemSeries::new(observation));
            }
        }
    }

    (items, observed)
}

/// Every tick from `first` to `last`, both inclusive.
fn dense_grid(first: DateTime<Utc>, last: DateTime<Utc>, tick: TimeDelta) -> Vec<DateTime<Utc>> {
    let mut grid = Vec::new();
    let mut current = first;
    while current <= last {
        grid.push(current);
        match current.checked_add_signed(tick) {
            Some(next) => current = next,
            None => break,
        }
    }
    grid
}

/// Orders by bucket, then rank with unranked points last. Stable.
pub fn sort_points(points: &mut [SeriesPoint]) {
    points.sort_by(|a, b| {
        a.bucket_time
            .cmp(&b.bucket_time)
            .then_with(|| compare_rank(a.rank, b.rank))
    });
}

fn compare_rank(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
