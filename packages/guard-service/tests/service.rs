use std::{
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};

use serde_json::Map;

use guard_config::{Config, Ingest, ObjectStore, Postgres, Scenario, Service, Storage};
use guard_domain::{Comparison, SampledDetection, TagPredicate};
use guard_service::{BoxFuture, FetchError, GuardService, IngestRequest, ObjectFetcher};
use guard_storage::db::Db;
use guard_testkit::{TestDatabase, fixtures};

#[derive(Default)]
struct RecordingFetcher {
	locations: Mutex<Vec<String>>,
}

impl ObjectFetcher for RecordingFetcher {
	fn fetch<'a>(
		&'a self,
		location: &'a str,
		_destination: &'a Path,
	) -> BoxFuture<'a, Result<u64, FetchError>> {
		Box::pin(async move {
			self.locations.lock().expect("lock").push(location.to_string());

			Ok(1)
		})
	}
}

fn test_config(dsn: &str) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2 },
			object_store: ObjectStore {
				endpoint: "http://127.0.0.1:9000".to_string(),
				bucket: "forestai-guard".to_string(),
				timeout_ms: 1_000,
				max_attempts: 1,
				base_backoff_ms: 0,
				max_backoff_ms: 0,
				download_dir: PathBuf::from("/tmp/guard"),
				default_headers: Map::new(),
			},
		},
		scenario: Scenario::default(),
		ingest: Ingest { drop_rate: 6 },
	}
}

fn detection(value: u64, labels: &[&str]) -> SampledDetection {
	SampledDetection {
		frame: fixtures::frame(value),
		labels: labels.iter().map(|label| label.to_string()).collect(),
		timestamp_nsec: None,
		latitude: None,
		longitude: None,
		speed_m_s: None,
	}
}

async fn setup(test_db: &TestDatabase, fetcher: Arc<RecordingFetcher>) -> GuardService {
	let cfg = test_config(test_db.dsn());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	GuardService::with_fetcher(cfg, db, fetcher)
}

#[tokio::test]
async fn empty_predicate_short_circuits() {
	let Some(base_dsn) = guard_testkit::env_dsn() else {
		// The store is never touched, so a lazy pool against an unreachable DSN is enough.
		let cfg = test_config("postgres://guard@127.0.0.1:1/guard");
		let pool = sqlx::postgres::PgPoolOptions::new()
			.connect_lazy(&cfg.storage.postgres.dsn)
			.expect("Failed to build lazy pool.");
		let service =
			GuardService::with_fetcher(cfg, Db { pool }, Arc::new(RecordingFetcher::default()));

		assert!(service.query_scenarios(&TagPredicate::new()).await.expect("query").is_none());
		assert!(service.retrieve(&TagPredicate::new()).await.expect("retrieve").is_none());

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = setup(&test_db, Arc::new(RecordingFetcher::default())).await;

	assert!(service.query_scenarios(&TagPredicate::new()).await.expect("query").is_none());

	service.db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUARD_PG_DSN to run."]
async fn ingest_then_retrieve_dense_frames() {
	let Some(base_dsn) = guard_testkit::env_dsn() else {
		eprintln!("Skipping ingest_then_retrieve_dense_frames; set GUARD_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let fetcher = Arc::new(RecordingFetcher::default());
	let service = setup(&test_db, fetcher.clone()).await;
	let frames =
		fixtures::captured_frames(fixtures::COLLECTOR_ID, fixtures::COLLECTION_SEQ, 0..31);
	let report = service
		.ingest(IngestRequest {
			collector_id: fixtures::COLLECTOR_ID.to_string(),
			collection_seq: fixtures::COLLECTION_SEQ.to_string(),
			frames,
			detections: vec![
				detection(6, &["car"]),
				detection(12, &["car", "traffic light"]),
				detection(24, &["car"]),
			],
			drop_rate: None,
		})
		.await
		.expect("Failed to ingest session.");

	assert_eq!(report.frames, 31);
	assert_eq!(report.detections, 6);
	assert_eq!(report.skipped, 0);

	let predicate = TagPredicate::new().with("car", Comparison::Gt, 0);
	let scenarios = service
		.query_scenarios(&predicate)
		.await
		.expect("Failed to query scenarios.")
		.expect("Expected a result for a non-empty predicate.");

	// Frame 18 carries no car, so 6..=12 and 24 form separate scenarios.
	assert_eq!(scenarios.len(), 2);
	assert_eq!(scenarios[0].frame_values(), &[6, 12]);
	assert_eq!(scenarios[1].frame_values(), &[24]);

	let retrieval = service
		.retrieve(&predicate)
		.await
		.expect("Failed to retrieve.")
		.expect("Expected a retrieval.");

	assert_eq!(retrieval.plan.location_count(), 7);
	assert_eq!(retrieval.plan.unresolved_count(), 0);
	assert!(retrieval.plan.scenarios[1].frames.is_empty());
	assert_eq!(retrieval.report.succeeded, 7);

	let fetched = fetcher.locations.lock().expect("lock").clone();

	assert_eq!(fetched.len(), 7);
	assert_eq!(fetched[0], "images/testuser/1583517124/0000000006.png");
	assert_eq!(fetched[6], "images/testuser/1583517124/0000000012.png");

	service.db.pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
