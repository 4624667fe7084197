use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// One detection document as stored at ingestion time.
///
/// `start_frame` and `end_frame` name the nearest sampled neighbors of `frame` within the same
/// session. They are references only; a query result may not contain them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
	pub collector_id: String,
	pub collection_seq: String,
	pub frame: String,
	pub start_frame: String,
	pub end_frame: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp_nsec: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub latitude: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub longitude: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub speed_m_s: Option<f64>,
	/// Detected instances per tag, stored as flat fields next to the fixed ones.
	#[serde(flatten)]
	pub tags: BTreeMap<String, u64>,
}
impl DetectionRecord {
	pub fn identity(&self) -> IdentityRef<'_> {
		IdentityRef {
			collector_id: &self.collector_id,
			collection_seq: &self.collection_seq,
			frame: &self.frame,
		}
	}

	pub fn tag_count(&self, tag: &str) -> Option<u64> {
		self.tags.get(tag).copied()
	}
}

/// Borrowed composite identity used as a lookup key while grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityRef<'a> {
	pub collector_id: &'a str,
	pub collection_seq: &'a str,
	pub frame: &'a str,
}
impl<'a> IdentityRef<'a> {
	/// Key of `frame` inside the same collector and session.
	pub fn neighbor(self, frame: &'a str) -> Self {
		Self { frame, ..self }
	}

	pub fn same_session(self, other: IdentityRef<'_>) -> bool {
		self.collector_id == other.collector_id && self.collection_seq == other.collection_seq
	}

	pub fn to_key(self) -> IdentityKey {
		IdentityKey {
			collector_id: self.collector_id.to_string(),
			collection_seq: self.collection_seq.to_string(),
			frame: self.frame.to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
	pub collector_id: String,
	pub collection_seq: String,
	pub frame: String,
}
impl fmt::Display for IdentityKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.collector_id, self.collection_seq, self.frame)
	}
}
