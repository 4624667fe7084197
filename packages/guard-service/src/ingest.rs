use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use guard_domain::{
	CapturedFrame, DetectionRecord, FrameFormat, IdentityKey, SampledDetection,
	ingest::{canonical_frames, link_neighbors, sample_frames},
};
use guard_storage::queries;

use crate::{Error, GuardService, Result};

/// One recorded session: every captured frame plus detector output.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
	pub collector_id: String,
	pub collection_seq: String,
	pub frames: Vec<CapturedFrame>,
	pub detections: Vec<SampledDetection>,
	/// Overrides `ingest.drop_rate` when set.
	#[serde(default)]
	pub drop_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
	pub frames: usize,
	pub detections: usize,
	/// Detector output on frames outside the sampled set.
	pub skipped: usize,
}

/// Canonical frames and linked records for one session, ready to store.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSession {
	pub frames: Vec<CapturedFrame>,
	pub records: Vec<DetectionRecord>,
	/// Detections dropped because their frame was not sampled.
	pub skipped: usize,
}

impl GuardService {
	/// Stores frame locations for every captured frame and one linked detection per sampled frame,
	/// all in a single transaction.
	pub async fn ingest(&self, req: IngestRequest) -> Result<IngestReport> {
		let format = FrameFormat::from_config(&self.cfg.scenario);
		let drop_rate = req.drop_rate.unwrap_or(self.cfg.ingest.drop_rate);
		let session = prepare_records(
			&req.collector_id,
			&req.collection_seq,
			&req.frames,
			req.detections,
			drop_rate,
			&format,
		)?;
		let mut tx = self.db.pool.begin().await?;

		for frame in &session.frames {
			queries::upsert_frame_location(&mut *tx, &req.collector_id, &req.collection_seq, frame)
				.await?;
		}
		for record in &session.records {
			queries::upsert_detection(&mut *tx, record).await?;
		}

		tx.commit().await?;

		tracing::info!(
			collector_id = %req.collector_id,
			collection_seq = %req.collection_seq,
			frames = session.frames.len(),
			detections = session.records.len(),
			skipped = session.skipped,
			"Session ingested."
		);

		Ok(IngestReport {
			frames: session.frames.len(),
			detections: session.records.len(),
			skipped: session.skipped,
		})
	}
}

/// Canonicalises frame identifiers, then links one record per sampled frame.
///
/// Sampled frames without detector output still get a record with no tags so that neighbor
/// references stay contiguous.
pub fn prepare_records(
	collector_id: &str,
	collection_seq: &str,
	frames: &[CapturedFrame],
	detections: Vec<SampledDetection>,
	drop_rate: u32,
	format: &FrameFormat,
) -> Result<PreparedSession> {
	if collector_id.trim().is_empty() || collection_seq.trim().is_empty() {
		return Err(Error::InvalidRequest {
			message: "collector_id and collection_seq must be non-empty.".to_string(),
		});
	}

	let frames = canonical_frames(collector_id, collection_seq, frames, format)?;
	let names = frames.iter().map(|frame| frame.frame.clone()).collect::<Vec<_>>();
	let sampled = sample_frames(names, drop_rate, format)?;
	let sampled_set = sampled.iter().map(String::as_str).collect::<HashSet<_>>();
	let mut by_frame = HashMap::with_capacity(sampled.len());
	let mut skipped = 0;

	for mut detection in detections {
		detection.frame = format.canonical(&detection.frame)?;

		if !sampled_set.contains(detection.frame.as_str()) {
			skipped += 1;

			continue;
		}
		if by_frame.contains_key(&detection.frame) {
			return Err(guard_domain::Error::DuplicateIdentity {
				key: IdentityKey {
					collector_id: collector_id.to_string(),
					collection_seq: collection_seq.to_string(),
					frame: detection.frame,
				},
			}
			.into());
		}

		by_frame.insert(detection.frame.clone(), detection);
	}

	let linked = sampled
		.iter()
		.map(|frame| {
			by_frame.remove(frame).unwrap_or_else(|| SampledDetection {
				frame: frame.clone(),
				labels: Vec::new(),
				timestamp_nsec: None,
				latitude: None,
				longitude: None,
				speed_m_s: None,
			})
		})
		.collect::<Vec<_>>();
	let records = link_neighbors(collector_id, collection_seq, linked, format)?;

	Ok(PreparedSession { frames, records, skipped })
}
