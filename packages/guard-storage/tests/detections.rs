use guard_domain::{CapturedFrame, Comparison, DetectionRecord, TagPredicate};
use guard_storage::{db::Db, queries};
use guard_testkit::{TestDatabase, fixtures};

fn detection(at: u64, tags: &[(&str, u64)]) -> DetectionRecord {
	DetectionRecord {
		timestamp_nsec: Some(1_583_517_124_000_000_000),
		latitude: Some(43.47),
		longitude: Some(-80.54),
		..fixtures::detection(at, at, at, tags)
	}
}

async fn connect(test_db: &TestDatabase) -> Db {
	let db =
		Db::connect(&test_db.postgres_config(2)).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUARD_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = guard_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set GUARD_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name LIKE 'guard_%'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 2);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUARD_PG_DSN to run."]
async fn tag_query_applies_every_condition() {
	let Some(base_dsn) = guard_testkit::env_dsn() else {
		eprintln!("Skipping tag_query_applies_every_condition; set GUARD_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	for record in [
		detection(0, &[("car", 2)]),
		detection(6, &[("car", 1), ("traffic light", 1)]),
		detection(12, &[("person", 4)]),
	] {
		queries::upsert_detection(&db.pool, &record).await.expect("Failed to insert detection.");
	}

	let cars = queries::find_detections_by_tags(
		&db.pool,
		&TagPredicate::new().with("car", Comparison::Gt, 0),
	)
	.await
	.expect("Failed to query detections.");

	assert_eq!(cars.len(), 2);

	let both = queries::find_detections_by_tags(
		&db.pool,
		&TagPredicate::new()
			.with("car", Comparison::Gt, 0)
			.with("traffic light", Comparison::Gt, 0),
	)
	.await
	.expect("Failed to query detections.");

	assert_eq!(both.len(), 1);

	let record = both.into_iter().next().expect("Expected one row.").into_record();

	assert_eq!(record.frame, "0000000006");
	assert_eq!(record.tag_count("traffic light"), Some(1));
	assert_eq!(record.latitude, Some(43.47));

	let none = queries::find_detections_by_tags(&db.pool, &TagPredicate::new())
		.await
		.expect("Empty predicate must not fail.");

	assert!(none.is_empty());

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUARD_PG_DSN to run."]
async fn frame_locations_are_scoped_by_collector() {
	let Some(base_dsn) = guard_testkit::env_dsn() else {
		eprintln!(
			"Skipping frame_locations_are_scoped_by_collector; set GUARD_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let frame = |location: &str| CapturedFrame {
		frame: "0000000001".to_string(),
		location: location.to_string(),
		timestamp_nsec: None,
	};

	queries::upsert_frame_location(&db.pool, "c1", "s1", &frame("images/c1/s1/0000000001.png"))
		.await
		.expect("Failed to insert frame.");
	queries::upsert_frame_location(&db.pool, "c2", "s1", &frame("images/c2/s1/0000000001.png"))
		.await
		.expect("Failed to insert frame.");

	let mut conn = db.acquire().await.expect("Failed to acquire connection.");
	let frames = vec!["0000000001".to_string(), "0000000002".to_string()];
	let resolved = queries::resolve_frame_locations(&mut *conn, "c2", "s1", &frames)
		.await
		.expect("Failed to resolve frames.");

	assert_eq!(resolved.len(), 1);
	assert_eq!(
		resolved.get("0000000001").map(String::as_str),
		Some("images/c2/s1/0000000001.png")
	);

	drop(conn);
	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
