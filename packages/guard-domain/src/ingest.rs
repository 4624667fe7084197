//! Ingestion-side helpers: detection sampling and neighbor linking.
//!
//! Detection only runs on every `drop_rate`-th captured frame. Each sampled detection records
//! the previous and next sampled frames as its `start_frame`/`end_frame`, which is what later lets
//! grouping chain sparse detections back into scenarios.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{DetectionRecord, Error, FrameFormat, IdentityKey, Result};

/// Detector output for one sampled frame before neighbor references are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledDetection {
	pub frame: String,
	/// One label per detected instance.
	#[serde(default)]
	pub labels: Vec<String>,
	#[serde(default)]
	pub timestamp_nsec: Option<i64>,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
	#[serde(default)]
	pub speed_m_s: Option<f64>,
}

/// A captured frame and where its image lives in the object store.
///
/// When `frame` is left empty it is taken from the location's file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedFrame {
	#[serde(default)]
	pub frame: String,
	pub location: String,
	#[serde(default)]
	pub timestamp_nsec: Option<i64>,
}

/// Frame identifier encoded in an image file name, e.g. `0000000012.png`.
pub fn frame_from_file_name(name: &str) -> &str {
	let base = name.rsplit('/').next().unwrap_or(name);

	base.split('.').next().unwrap_or(base)
}

/// Canonical copies of `frames`, with identifiers re-padded to the configured width.
///
/// Two entries naming the same frame are rejected.
pub fn canonical_frames(
	collector_id: &str,
	collection_seq: &str,
	frames: &[CapturedFrame],
	format: &FrameFormat,
) -> Result<Vec<CapturedFrame>> {
	let mut seen = HashSet::with_capacity(frames.len());
	let mut out = Vec::with_capacity(frames.len());

	for captured in frames {
		let raw = if captured.frame.trim().is_empty() {
			frame_from_file_name(&captured.location)
		} else {
			captured.frame.as_str()
		};
		let frame = format.canonical(raw)?;

		if !seen.insert(frame.clone()) {
			return Err(Error::DuplicateIdentity {
				key: IdentityKey {
					collector_id: collector_id.to_string(),
					collection_seq: collection_seq.to_string(),
					frame,
				},
			});
		}

		out.push(CapturedFrame {
			frame,
			location: captured.location.clone(),
			timestamp_nsec: captured.timestamp_nsec,
		});
	}

	Ok(out)
}

/// Keeps every `drop_rate`-th frame in ordinal order, starting with the first. Returned
/// identifiers are canonical.
pub fn sample_frames(
	frames: Vec<String>,
	drop_rate: u32,
	format: &FrameFormat,
) -> Result<Vec<String>> {
	if drop_rate == 0 {
		return Err(Error::InvalidDropRate);
	}

	let mut values =
		frames.iter().map(|frame| format.parse(frame)).collect::<Result<Vec<_>>>()?;

	values.sort_unstable();

	values.into_iter().step_by(drop_rate as usize).map(|value| format.format(value)).collect()
}

/// Builds detection records for one session with neighbor references filled in.
///
/// The first sample references itself and its successor, the last its predecessor and itself,
/// and a lone sample only itself. Frame identifiers and neighbor references are canonical.
pub fn link_neighbors(
	collector_id: &str,
	collection_seq: &str,
	detections: Vec<SampledDetection>,
	format: &FrameFormat,
) -> Result<Vec<DetectionRecord>> {
	let mut keyed = Vec::with_capacity(detections.len());

	for mut detection in detections {
		let value = format.parse(&detection.frame)?;

		detection.frame = format.format(value)?;

		keyed.push((value, detection));
	}

	keyed.sort_by_key(|(value, _)| *value);

	if let Some(pair) = keyed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
		return Err(Error::DuplicateIdentity {
			key: IdentityKey {
				collector_id: collector_id.to_string(),
				collection_seq: collection_seq.to_string(),
				frame: pair[1].1.frame.clone(),
			},
		});
	}

	let frames = keyed.iter().map(|(_, detection)| detection.frame.clone()).collect::<Vec<_>>();
	let last = frames.len().saturating_sub(1);

	Ok(keyed
		.into_iter()
		.enumerate()
		.map(|(position, (_, detection))| {
			let start_frame = frames[position.saturating_sub(1)].clone();
			let end_frame = frames[(position + 1).min(last)].clone();
			let mut tags = BTreeMap::new();

			for label in detection.labels {
				*tags.entry(label).or_insert(0) += 1;
			}

			DetectionRecord {
				collector_id: collector_id.to_string(),
				collection_seq: collection_seq.to_string(),
				frame: detection.frame,
				start_frame,
				end_frame,
				timestamp_nsec: detection.timestamp_nsec,
				latitude: detection.latitude,
				longitude: detection.longitude,
				speed_m_s: detection.speed_m_s,
				tags,
			}
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sampled(frame: &str, labels: &[&str]) -> SampledDetection {
		SampledDetection {
			frame: frame.to_string(),
			labels: labels.iter().map(|label| label.to_string()).collect(),
			timestamp_nsec: None,
			latitude: None,
			longitude: None,
			speed_m_s: None,
		}
	}

	fn captured(frame: &str, location: &str) -> CapturedFrame {
		CapturedFrame {
			frame: frame.to_string(),
			location: location.to_string(),
			timestamp_nsec: None,
		}
	}

	#[test]
	fn strips_extension_and_directories() {
		assert_eq!(frame_from_file_name("0000000012.png"), "0000000012");
		assert_eq!(frame_from_file_name("/data/run/0000000012.png"), "0000000012");
		assert_eq!(frame_from_file_name("0000000012"), "0000000012");
	}

	#[test]
	fn canonical_frames_repad_and_fall_back_to_file_name() {
		let frames = vec![
			captured("5", "images/c1/s1/5.png"),
			captured("", "images/c1/s1/0000000011.png"),
			captured("0000000017", "images/c1/s1/0000000017.png"),
		];
		let canonical = canonical_frames("c1", "s1", &frames, &FrameFormat::default())
			.expect("canonical failed");

		assert_eq!(
			canonical.iter().map(|frame| frame.frame.as_str()).collect::<Vec<_>>(),
			vec!["0000000005", "0000000011", "0000000017"]
		);
		assert_eq!(canonical[0].location, "images/c1/s1/5.png");
	}

	#[test]
	fn canonical_frames_reject_the_same_frame_twice() {
		let frames = vec![captured("5", "a/5.png"), captured("0000000005", "b/0000000005.png")];
		let err = canonical_frames("c1", "s1", &frames, &FrameFormat::default())
			.expect_err("Expected rejection.");

		assert!(
			matches!(&err, Error::DuplicateIdentity { key } if key.frame == "0000000005"),
			"Unexpected error: {err:?}"
		);
	}

	#[test]
	fn samples_every_nth_frame_in_order() {
		let frames = (0..13).rev().map(|n| format!("{n:010}")).collect::<Vec<_>>();
		let sampled = sample_frames(frames, 6, &FrameFormat::default()).expect("sample failed");

		assert_eq!(sampled, vec!["0000000000", "0000000006", "0000000012"]);
		assert!(matches!(
			sample_frames(Vec::new(), 0, &FrameFormat::default()),
			Err(Error::InvalidDropRate)
		));
	}

	#[test]
	fn links_previous_and_next_samples() {
		let detections = vec![
			sampled("0000000012", &["car"]),
			sampled("0000000000", &["car", "car", "traffic light"]),
			sampled("0000000006", &[]),
		];
		let records =
			link_neighbors("c1", "s1", detections, &FrameFormat::default()).expect("link failed");
		let links = records
			.iter()
			.map(|r| (r.frame.as_str(), r.start_frame.as_str(), r.end_frame.as_str()))
			.collect::<Vec<_>>();

		assert_eq!(
			links,
			vec![
				("0000000000", "0000000000", "0000000006"),
				("0000000006", "0000000000", "0000000012"),
				("0000000012", "0000000006", "0000000012"),
			]
		);
		assert_eq!(records[0].tag_count("car"), Some(2));
		assert_eq!(records[0].tag_count("traffic light"), Some(1));
		assert!(records[1].tags.is_empty());
	}

	#[test]
	fn unpadded_frames_are_linked_in_canonical_form() {
		let detections = vec![sampled("11", &["car"]), sampled("5", &["car"])];
		let records =
			link_neighbors("c1", "s1", detections, &FrameFormat::default()).expect("link failed");

		assert_eq!(records[0].frame, "0000000005");
		assert_eq!(records[0].end_frame, "0000000011");
		assert_eq!(records[1].frame, "0000000011");
		assert_eq!(records[1].start_frame, "0000000005");
	}

	#[test]
	fn lone_sample_references_itself() {
		let detections = vec![sampled("0000000005", &["person"])];
		let records =
			link_neighbors("c1", "s1", detections, &FrameFormat::default()).expect("link failed");

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].start_frame, "0000000005");
		assert_eq!(records[0].end_frame, "0000000005");
	}

	#[test]
	fn rejects_repeated_frames() {
		let detections = vec![sampled("0000000005", &[]), sampled("5", &[])];

		assert!(matches!(
			link_neighbors("c1", "s1", detections, &FrameFormat::default()),
			Err(Error::DuplicateIdentity { .. })
		));
	}
}
