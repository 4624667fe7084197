use std::collections::BTreeMap;

use guard_domain::{CapturedFrame, DetectionRecord};

pub const COLLECTOR_ID: &str = "testuser";
pub const COLLECTION_SEQ: &str = "1583517124";

/// Zero-padded frame identifier at the default width.
pub fn frame(value: u64) -> String {
	format!("{value:010}")
}

/// A detection in the default session that links `at` to `start` and `end`.
pub fn detection(at: u64, start: u64, end: u64, tags: &[(&str, u64)]) -> DetectionRecord {
	DetectionRecord {
		collector_id: COLLECTOR_ID.to_string(),
		collection_seq: COLLECTION_SEQ.to_string(),
		frame: frame(at),
		start_frame: frame(start),
		end_frame: frame(end),
		timestamp_nsec: None,
		latitude: None,
		longitude: None,
		speed_m_s: None,
		tags: tags.iter().map(|(tag, count)| (tag.to_string(), *count)).collect::<BTreeMap<_, _>>(),
	}
}

/// Captured frames `range` of one session, stored under `images/{collector}/{seq}/`.
pub fn captured_frames(
	collector_id: &str,
	collection_seq: &str,
	range: std::ops::Range<u64>,
) -> Vec<CapturedFrame> {
	range
		.map(|value| CapturedFrame {
			frame: frame(value),
			location: format!("images/{collector_id}/{collection_seq}/{}.png", frame(value)),
			timestamp_nsec: None,
		})
		.collect()
}
