use std::collections::BTreeMap;

use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use guard_domain::DetectionRecord;

#[derive(Debug, sqlx::FromRow)]
pub struct DetectionRow {
	pub detection_id: Uuid,
	pub collector_id: String,
	pub collection_seq: String,
	pub frame: String,
	pub start_frame: String,
	pub end_frame: String,
	pub tags: Json<BTreeMap<String, u64>>,
	pub timestamp_nsec: Option<i64>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub speed_m_s: Option<f64>,
	pub created_at: OffsetDateTime,
}
impl DetectionRow {
	pub fn into_record(self) -> DetectionRecord {
		DetectionRecord {
			collector_id: self.collector_id,
			collection_seq: self.collection_seq,
			frame: self.frame,
			start_frame: self.start_frame,
			end_frame: self.end_frame,
			timestamp_nsec: self.timestamp_nsec,
			latitude: self.latitude,
			longitude: self.longitude,
			speed_m_s: self.speed_m_s,
			tags: self.tags.0,
		}
	}
}

