use serde::Serialize;

use crate::{DetectionRecord, Error, FrameFormat, Result, grouping};

/// A sorted, non-empty run of connected detections from one collector session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
	records: Vec<DetectionRecord>,
	#[serde(skip)]
	frames: Vec<u64>,
}
impl Scenario {
	pub fn collector_id(&self) -> &str {
		&self.records[0].collector_id
	}

	pub fn collection_seq(&self) -> &str {
		&self.records[0].collection_seq
	}

	pub fn records(&self) -> &[DetectionRecord] {
		&self.records
	}

	/// Parsed frame ordinals, ascending and distinct.
	pub fn frame_values(&self) -> &[u64] {
		&self.frames
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn first_frame(&self) -> u64 {
		self.frames[0]
	}

	pub fn last_frame(&self) -> u64 {
		self.frames[self.frames.len() - 1]
	}
}

/// Orders one group by numeric frame value.
///
/// Equal frame values within a group are a data-integrity violation and are reported.
pub fn sort_scenario(records: Vec<DetectionRecord>, format: &FrameFormat) -> Result<Scenario> {
	let Some(head) = records.first() else {
		return Err(Error::EmptyScenario);
	};
	let head = head.identity();

	if let Some(stray) = records.iter().find(|record| !head.same_session(record.identity())) {
		return Err(Error::MixedScenario {
			expected: format!("{}/{}", head.collector_id, head.collection_seq),
			found: format!("{}/{}", stray.collector_id, stray.collection_seq),
		});
	}

	let mut keyed = Vec::with_capacity(records.len());

	for (position, record) in records.iter().enumerate() {
		keyed.push((format.parse(&record.frame)?, position));
	}

	keyed.sort_unstable();

	if let Some(pair) = keyed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
		return Err(Error::DuplicateFrame {
			collector_id: head.collector_id.to_string(),
			collection_seq: head.collection_seq.to_string(),
			frame: pair[0].0,
		});
	}

	let frames = keyed.iter().map(|(frame, _)| *frame).collect();
	let mut slots = records.into_iter().map(Some).collect::<Vec<_>>();
	let records = keyed.iter().filter_map(|(_, position)| slots[*position].take()).collect();

	Ok(Scenario { records, frames })
}

/// Index, group, and sort a result set into scenarios.
///
/// Scenarios are ordered by collector, session, then first frame, so the output is independent
/// of the order the store returned records in.
pub fn build_scenarios(
	records: Vec<DetectionRecord>,
	format: &FrameFormat,
) -> Result<Vec<Scenario>> {
	let total = records.len();
	let groups = grouping::group_records(records)?;
	let mut scenarios = groups
		.into_iter()
		.map(|group| sort_scenario(group, format))
		.collect::<Result<Vec<_>>>()?;

	scenarios.sort_by(|a, b| {
		(a.collector_id(), a.collection_seq(), a.first_frame()).cmp(&(
			b.collector_id(),
			b.collection_seq(),
			b.first_frame(),
		))
	});

	tracing::debug!(records = total, scenarios = scenarios.len(), "Grouped detection records.");

	Ok(scenarios)
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use super::*;

	fn record(collection_seq: &str, frame: &str) -> DetectionRecord {
		DetectionRecord {
			collector_id: "c1".to_string(),
			collection_seq: collection_seq.to_string(),
			frame: frame.to_string(),
			start_frame: frame.to_string(),
			end_frame: frame.to_string(),
			timestamp_nsec: None,
			latitude: None,
			longitude: None,
			speed_m_s: None,
			tags: BTreeMap::new(),
		}
	}

	#[test]
	fn sorts_numerically_not_lexically() {
		let records = vec![record("s1", "100"), record("s1", "0000000020"), record("s1", "3")];
		let scenario = sort_scenario(records, &FrameFormat::default()).expect("sort failed");
		let frames = scenario.records().iter().map(|r| r.frame.as_str()).collect::<Vec<_>>();

		assert_eq!(frames, vec!["3", "0000000020", "100"]);
		assert_eq!(scenario.frame_values(), &[3, 20, 100]);
		assert_eq!(scenario.first_frame(), 3);
		assert_eq!(scenario.last_frame(), 100);
	}

	#[test]
	fn reports_duplicate_frame_values() {
		let records = vec![record("s1", "0000000010"), record("s1", "10")];
		let err = sort_scenario(records, &FrameFormat::default()).expect_err("Expected duplicate.");

		assert!(matches!(err, Error::DuplicateFrame { frame: 10, .. }), "Unexpected: {err:?}");
	}

	#[test]
	fn rejects_empty_and_mixed_groups() {
		assert!(matches!(
			sort_scenario(Vec::new(), &FrameFormat::default()),
			Err(Error::EmptyScenario)
		));

		let records = vec![record("s1", "1"), record("s2", "2")];

		assert!(matches!(
			sort_scenario(records, &FrameFormat::default()),
			Err(Error::MixedScenario { .. })
		));
	}
}
