use serde::Serialize;

use guard_domain::{FrameFormat, Scenario, TagPredicate, build_scenarios};
use guard_storage::queries;

use crate::{DownloadReport, GuardService, Result, RetrievalPlan};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retrieval {
	pub plan: RetrievalPlan,
	pub report: DownloadReport,
}

impl GuardService {
	/// Runs the tag query and groups the matching detections into sorted scenarios.
	///
	/// Returns `None` for an empty predicate without touching the store.
	pub async fn query_scenarios(&self, predicate: &TagPredicate) -> Result<Option<Vec<Scenario>>> {
		if predicate.is_empty() {
			return Ok(None);
		}

		predicate.validate()?;

		let rows = {
			let mut conn = self.db.acquire().await?;

			queries::find_detections_by_tags(&mut *conn, predicate).await?
		};
		let records = rows.into_iter().map(|row| row.into_record()).collect::<Vec<_>>();
		let matched = records.len();
		let scenarios = build_scenarios(records, &FrameFormat::from_config(&self.cfg.scenario))?;

		tracing::info!(records = matched, scenarios = scenarios.len(), "Scenarios reconstructed.");

		Ok(Some(scenarios))
	}

	/// Query, plan, and download in one pass.
	pub async fn retrieve(&self, predicate: &TagPredicate) -> Result<Option<Retrieval>> {
		let Some(scenarios) = self.query_scenarios(predicate).await? else {
			return Ok(None);
		};
		let plan = self.plan(&scenarios).await?;
		let report = self.download(&plan).await;

		Ok(Some(Retrieval { plan, report }))
	}
}
