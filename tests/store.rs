use chrono::{DateTime, Duration, TimeZone, Utc};
use rankseries_lib::{
    db::ObservationQuery,
    harvest::{ingest_file, HarvestTarget},
    load_series,
    models::{
        GapKind, Granularity, HarvestTaskInput, Observation, RankingAlgorithm, RecencyWindow,
    },
    tasks, Database, OutputFormat, SeriesRequest, StatsError,
};
use rusqlite::params;
use tempfile::TempDir;

fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap()
}

fn open() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
    (dir, db)
}

fn observation(subject: &str, item: &str, hour: i64, rank: i32) -> Observation {
    let bucket_time = origin() + Duration::hours(hour);
    Observation {
        id: None,
        item_id: item.into(),
        bucket_time,
        polled_at: bucket_time + Duration::minutes(1),
        rank,
        score: Some(100 - rank),
        comment_count: Some(rank),
        title: format!("{item} title"),
        permalink: format!("/r/{subject}/comments/{item}"),
        subject_id: format!("t5_{subject}"),
        subject_name: subject.into(),
        author_id: "t2_u".into(),
        author_name: "someone".into(),
        ranking_algorithm: RankingAlgorithm::Top,
        recency_window: RecencyWindow::Day,
        granularity: Granularity::Hour,
    }
}

fn query(subject: &str, from_hour: i64, to_hour: i64) -> ObservationQuery {
    ObservationQuery {
        subject_name: subject.into(),
        ranking_algorithm: RankingAlgorithm::Top,
        recency_window: RecencyWindow::Day,
        granularity: Granularity::Hour,
        from_time: origin() + Duration::hours(from_hour),
        to_time: origin() + Duration::hours(to_hour),
    }
}

fn request(granularity: Granularity, backfill: bool) -> SeriesRequest {
    SeriesRequest {
        subject_name: "memes".into(),
        ranking_algorithm: RankingAlgorithm::Top,
        recency_window: RecencyWindow::Day,
        granularity,
        from_time: origin(),
        to_time: origin() + Duration::days(1),
        backfill,
        output_format: OutputFormat::Json,
    }
}

#[tokio::test]
async fn query_filters_subject_and_uses_half_open_range() {
    let (_dir, db) = open();
    let stored = db
        .insert_observations(vec![
            observation("memes", "t3_a", 0, 1),
            observation("memes", "t3_a", 1, 2),
            observation("memes", "t3_a", 2, 3),
            observation("funny", "t3_z", 1, 1),
        ])
        .await;
    assert_eq!(stored, 4);

    let rows = db.query_observations(&query("memes", 0, 2)).await.unwrap();
    let hours: Vec<i64> = rows
        .iter()
        .map(|o| (o.bucket_time - origin()).num_hours())
        .collect();
    let mut sorted = hours.clone();
    sorted.sort();
    assert_eq!(sorted, vec![0, 1]);
    assert!(rows.iter().all(|o| o.subject_name == "memes" && o.id.is_some()));

    let mut other_view = query("memes", 0, 24);
    other_view.recency_window = RecencyWindow::Hour;
    assert!(db.query_observations(&other_view).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_bucket_keeps_the_latest_sample() {
    let (_dir, db) = open();
    db.insert_observation(&observation("memes", "t3_a", 0, 5))
        .await
        .unwrap();

    let mut resample = observation("memes", "t3_a", 0, 2);
    resample.polled_at = resample.polled_at + Duration::minutes(20);
    resample.score = Some(999);
    db.insert_observation(&resample).await.unwrap();

    let rows = db.query_observations(&query("memes", 0, 1)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].rank, 2);
    assert_eq!(rows[0].score, Some(999));
    assert_eq!(rows[0].polled_at, resample.polled_at);
}

#[tokio::test]
async fn rank_outside_top_k_is_rejected_by_the_store() {
    let (_dir, db) = open();
    let stored = db
        .insert_observations(vec![
            observation("memes", "t3_a", 0, 21),
            observation("memes", "t3_b", 0, 20),
        ])
        .await;
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn corrupt_metric_cells_read_back_as_unknown() {
    let (_dir, db) = open();
    let bucket = "2025-02-03T00:00:00.000Z";
    db.execute(move |conn| {
        conn.execute(
            "INSERT INTO observations (
                item_id, bucket_time, polled_at, rank, score, comment_count,
                subject_name, ranking_algorithm, recency_window, granularity
            ) VALUES (?1, ?2, ?2, 1, ?3, ?4, 'memes', 'top', 'day', 'hour')",
            params!["t3_a", bucket, "1.2k", 3.5_f64],
        )?;
        conn.execute(
            "INSERT INTO observations (
                item_id, bucket_time, polled_at, rank, score, comment_count,
                subject_name, ranking_algorithm, recency_window, granularity
            ) VALUES (?1, ?2, ?2, 2, ?3, NULL, 'memes', 'top', 'day', 'hour')",
            params!["t3_b", bucket, 42],
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let mut rows = db.query_observations(&query("memes", 0, 1)).await.unwrap();
    rows.sort_by_key(|o| o.rank);
    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].score, rows[0].comment_count), (None, None));
    assert_eq!((rows[1].score, rows[1].comment_count), (Some(42), None));
    assert_eq!(rows[0].title, "");
}

#[tokio::test]
async fn task_registry_round_trip() {
    let (_dir, db) = open();
    let input = HarvestTaskInput {
        subject_name: "  memes ".into(),
        min_item_count: 20,
        interval: Granularity::Hour,
        ranking_algorithm: RankingAlgorithm::Top,
        recency_window: RecencyWindow::Day,
    };
    let created = tasks::create_task(&db, input.clone()).await.unwrap();
    assert_eq!(created.subject_name, "memes");

    let weekly = HarvestTaskInput {
        interval: Granularity::Week,
        ..input
    };
    assert!(matches!(
        tasks::create_task(&db, weekly).await,
        Err(StatsError::UnsupportedGranularity(_))
    ));

    assert_eq!(tasks::list_tasks(&db).await.unwrap(), vec![created.clone()]);
    assert_eq!(
        db.tasks_by_interval(Granularity::Hour).await.unwrap().len(),
        1
    );
    assert!(db.tasks_by_interval(Granularity::Day).await.unwrap().is_empty());

    tasks::delete_task(&db, created.id).await.unwrap();
    assert!(tasks::list_tasks(&db).await.unwrap().is_empty());
    assert!(matches!(
        tasks::delete_task(&db, created.id).await,
        Err(StatsError::Validation(_))
    ));
}

#[tokio::test]
async fn load_series_backfills_stored_observations() {
    let (_dir, db) = open();
    // Hour 1 was never polled; t3_b dropped out at hour 2.
    for sample in [
        observation("memes", "t3_a", 0, 1),
        observation("memes", "t3_b", 0, 2),
        observation("memes", "t3_a", 2, 1),
    ] {
        db.insert_observation(&sample).await.unwrap();
    }

    let plain = load_series(&db, &request(Granularity::Hour, false))
        .await
        .unwrap();
    assert_eq!(plain.len(), 3);

    let filled = load_series(&db, &request(Granularity::Hour, true))
        .await
        .unwrap();
    assert_eq!(filled.len(), 6);

    let gaps: Vec<(String, i64, Option<GapKind>)> = filled
        .iter()
        .map(|p| (p.item_id.clone(), (p.bucket_time - origin()).num_hours(), p.gap))
        .collect();
    assert_eq!(
        gaps,
        vec![
            ("t3_a".into(), 0, None),
            ("t3_b".into(), 0, None),
            ("t3_a".into(), 1, Some(GapKind::PollFailure)),
            ("t3_b".into(), 1, Some(GapKind::PollFailure)),
            ("t3_a".into(), 2, None),
            ("t3_b".into(), 2, Some(GapKind::ItemDropout)),
        ]
    );
    assert_eq!(filled[5].subject_name, "memes");
    assert_eq!(filled[2].subject_name, "");
}

#[tokio::test]
async fn load_series_rejects_weekly_granularity() {
    let (_dir, db) = open();
    db.insert_observation(&observation("memes", "t3_a", 0, 1))
        .await
        .unwrap();
    assert!(matches!(
        load_series(&db, &request(Granularity::Week, true)).await,
        Err(StatsError::UnsupportedGranularity(_))
    ));
}

#[tokio::test]
async fn ingests_a_saved_scraper_dump() {
    let (dir, db) = open();
    let dump = dir.path().join("dump.json");
    std::fs::write(
        &dump,
        r#"[
            {"data_ks_id": "t3_a", "subreddit_prefix_name": "r/memes", "score": "10", "index": 0},
            {"data_ks_id": "t3_b", "subreddit_prefix_name": "r/memes", "score": "n/a", "index": 1},
            {"data_ks_id": "", "index": 2}
        ]"#,
    )
    .unwrap();

    let target = HarvestTarget {
        subject_name: "memes".into(),
        ranking_algorithm: RankingAlgorithm::Top,
        recency_window: RecencyWindow::Day,
        granularity: Granularity::Hour,
    };
    let polled_at = origin() + Duration::hours(3) + Duration::minutes(17);
    let stored = ingest_file(&db, &dump, &target, polled_at).await.unwrap();
    assert_eq!(stored, 2);

    let mut rows = db.query_observations(&query("memes", 3, 4)).await.unwrap();
    rows.sort_by_key(|o| o.rank);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].bucket_time, origin() + Duration::hours(3));
    assert_eq!(rows[0].score, Some(10));
    assert_eq!(rows[1].score, None);
}

#[tokio::test]
async fn store_failures_surface_as_storage_errors() {
    let (_dir, db) = open();
    db.execute(|conn| {
        conn.execute_batch("DROP TABLE observations")?;
        Ok(())
    })
    .await
    .unwrap();

    let err = load_series(&db, &request(Granularity::Hour, true))
        .await
        .unwrap_err();
    assert!(matches!(err, StatsError::Storage(_)));
    assert!(err.to_string().contains("no such table"), "{err}");
}
