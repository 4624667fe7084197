//! Turning sorted scenarios into concrete object locations.

use std::collections::HashMap;

use serde::Serialize;

use guard_domain::{RangeExpander, Scenario};
use guard_storage::queries;

use crate::{GuardService, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameLocation {
	pub frame: String,
	pub location: String,
}

/// Dense frames of one scenario and the subset that resolved to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioPlan {
	/// Position of the scenario in the grouped result.
	pub index: usize,
	pub collector_id: String,
	pub collection_seq: String,
	pub frames: Vec<String>,
	pub locations: Vec<FrameLocation>,
	/// Expanded frames with no recorded location, in frame order.
	pub unresolved: Vec<String>,
}
impl ScenarioPlan {
	/// Pairs each expanded frame with its resolved location, keeping frame order.
	pub fn from_resolved(
		index: usize,
		scenario: &Scenario,
		frames: Vec<String>,
		resolved: &HashMap<String, String>,
	) -> Self {
		let mut locations = Vec::with_capacity(frames.len());
		let mut unresolved = Vec::new();

		for frame in &frames {
			match resolved.get(frame) {
				Some(location) => locations
					.push(FrameLocation { frame: frame.clone(), location: location.clone() }),
				None => unresolved.push(frame.clone()),
			}
		}

		Self {
			index,
			collector_id: scenario.collector_id().to_string(),
			collection_seq: scenario.collection_seq().to_string(),
			frames,
			locations,
			unresolved,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalPlan {
	pub scenarios: Vec<ScenarioPlan>,
}
impl RetrievalPlan {
	pub fn location_count(&self) -> usize {
		self.scenarios.iter().map(|scenario| scenario.locations.len()).sum()
	}

	pub fn unresolved_count(&self) -> usize {
		self.scenarios.iter().map(|scenario| scenario.unresolved.len()).sum()
	}
}

impl GuardService {
	/// Expands every scenario and resolves its frames with one lookup per scenario.
	///
	/// All lookups share one pooled connection that is returned when this call ends.
	pub async fn plan(&self, scenarios: &[Scenario]) -> Result<RetrievalPlan> {
		let expander = RangeExpander::from_config(&self.cfg.scenario);
		let mut conn = self.db.acquire().await?;
		let mut plan = RetrievalPlan::default();

		for (index, scenario) in scenarios.iter().enumerate() {
			let frames = expander.expand(scenario)?;
			let resolved = queries::resolve_frame_locations(
				&mut *conn,
				scenario.collector_id(),
				scenario.collection_seq(),
				&frames,
			)
			.await?;
			let scenario_plan = ScenarioPlan::from_resolved(index, scenario, frames, &resolved);

			if !scenario_plan.unresolved.is_empty() {
				tracing::warn!(
					collector_id = %scenario_plan.collector_id,
					collection_seq = %scenario_plan.collection_seq,
					scenario = index,
					unresolved = scenario_plan.unresolved.len(),
					"Frames without a stored location were skipped."
				);
			}

			plan.scenarios.push(scenario_plan);
		}

		tracing::info!(
			scenarios = plan.scenarios.len(),
			locations = plan.location_count(),
			unresolved = plan.unresolved_count(),
			"Retrieval plan built."
		);

		Ok(plan)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use guard_domain::{DetectionRecord, FrameFormat, build_scenarios};

	use super::*;

	fn rec(at: u64, start: u64, end: u64) -> DetectionRecord {
		DetectionRecord {
			collector_id: "c1".to_string(),
			collection_seq: "s1".to_string(),
			frame: format!("{at:010}"),
			start_frame: format!("{start:010}"),
			end_frame: format!("{end:010}"),
			timestamp_nsec: None,
			latitude: None,
			longitude: None,
			speed_m_s: None,
			tags: BTreeMap::new(),
		}
	}

	#[test]
	fn unresolved_frames_are_listed_not_located() {
		let scenarios = build_scenarios(vec![rec(1, 1, 4), rec(4, 1, 4)], &FrameFormat::default())
			.expect("group failed");
		let frames = RangeExpander::default().expand(&scenarios[0]).expect("expand failed");
		let resolved = HashMap::from([
			("0000000001".to_string(), "images/1.png".to_string()),
			("0000000003".to_string(), "images/3.png".to_string()),
			("0000000004".to_string(), "images/4.png".to_string()),
		]);
		let plan = ScenarioPlan::from_resolved(0, &scenarios[0], frames, &resolved);

		assert_eq!(plan.frames.len(), 4);
		assert_eq!(
			plan.locations.iter().map(|entry| entry.frame.as_str()).collect::<Vec<_>>(),
			vec!["0000000001", "0000000003", "0000000004"]
		);
		assert_eq!(plan.unresolved, vec!["0000000002".to_string()]);

		let retrieval = RetrievalPlan { scenarios: vec![plan] };

		assert_eq!(retrieval.location_count(), 3);
		assert_eq!(retrieval.unresolved_count(), 1);
	}
}
