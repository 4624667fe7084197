use std::collections::HashMap;

use sqlx::{Executor, Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use guard_domain::{CapturedFrame, DetectionRecord, TagPredicate};

use crate::{Error, Result, models::DetectionRow};

const DETECTION_COLUMNS: &str = "\
detection_id,
	collector_id,
	collection_seq,
	frame,
	start_frame,
	end_frame,
	tags,
	timestamp_nsec,
	latitude,
	longitude,
	speed_m_s,
	created_at";

/// Detections whose tag counts satisfy every condition of `predicate`.
///
/// An empty predicate matches nothing and never reaches the database.
pub async fn find_detections_by_tags<'e, E>(
	executor: E,
	predicate: &TagPredicate,
) -> Result<Vec<DetectionRow>>
where
	E: Executor<'e, Database = Postgres>,
{
	if predicate.is_empty() {
		return Ok(Vec::new());
	}

	let mut builder = QueryBuilder::<Postgres>::new(format!(
		"SELECT\n\t{DETECTION_COLUMNS}\nFROM guard_detections\nWHERE TRUE"
	));

	for (tag, op, value) in predicate.conditions() {
		let value = i64::try_from(value).map_err(|_| {
			Error::InvalidArgument(format!("Threshold for tag {tag:?} is out of range."))
		})?;

		builder.push(" AND (tags ->> ");
		builder.push_bind(tag.to_string());
		builder.push(")::bigint ");
		builder.push(op.as_sql());
		builder.push(" ");
		builder.push_bind(value);
	}

	builder.push(" ORDER BY collector_id, collection_seq, frame");

	let rows = builder.build_query_as::<DetectionRow>().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn upsert_detection<'e, E>(executor: E, record: &DetectionRecord) -> Result<Uuid>
where
	E: Executor<'e, Database = Postgres>,
{
	let detection_id = sqlx::query_scalar::<_, Uuid>(
		"\
INSERT INTO guard_detections (
	collector_id,
	collection_seq,
	frame,
	start_frame,
	end_frame,
	tags,
	timestamp_nsec,
	latitude,
	longitude,
	speed_m_s
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
ON CONFLICT (collector_id, collection_seq, frame) DO UPDATE
SET
	start_frame = EXCLUDED.start_frame,
	end_frame = EXCLUDED.end_frame,
	tags = EXCLUDED.tags,
	timestamp_nsec = EXCLUDED.timestamp_nsec,
	latitude = EXCLUDED.latitude,
	longitude = EXCLUDED.longitude,
	speed_m_s = EXCLUDED.speed_m_s
RETURNING detection_id",
	)
	.bind(record.collector_id.as_str())
	.bind(record.collection_seq.as_str())
	.bind(record.frame.as_str())
	.bind(record.start_frame.as_str())
	.bind(record.end_frame.as_str())
	.bind(Json(&record.tags))
	.bind(record.timestamp_nsec)
	.bind(record.latitude)
	.bind(record.longitude)
	.bind(record.speed_m_s)
	.fetch_one(executor)
	.await?;

	Ok(detection_id)
}

pub async fn upsert_frame_location<'e, E>(
	executor: E,
	collector_id: &str,
	collection_seq: &str,
	frame: &CapturedFrame,
) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO guard_frame_metadata (collector_id, collection_seq, frame, location, timestamp_nsec)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (collector_id, collection_seq, frame) DO UPDATE
SET
	location = EXCLUDED.location,
	timestamp_nsec = EXCLUDED.timestamp_nsec",
	)
	.bind(collector_id)
	.bind(collection_seq)
	.bind(frame.frame.as_str())
	.bind(frame.location.as_str())
	.bind(frame.timestamp_nsec)
	.execute(executor)
	.await?;

	Ok(())
}

/// Storage locations for `frames` of one collector session, keyed by frame.
///
/// Frames without metadata are simply absent from the map.
pub async fn resolve_frame_locations<'e, E>(
	executor: E,
	collector_id: &str,
	collection_seq: &str,
	frames: &[String],
) -> Result<HashMap<String, String>>
where
	E: Executor<'e, Database = Postgres>,
{
	if frames.is_empty() {
		return Ok(HashMap::new());
	}

	let rows: Vec<(String, String)> = sqlx::query_as(
		"\
SELECT frame, location
FROM guard_frame_metadata
WHERE collector_id = $1
	AND collection_seq = $2
	AND frame = ANY($3)",
	)
	.bind(collector_id)
	.bind(collection_seq)
	.bind(frames)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().collect())
}
