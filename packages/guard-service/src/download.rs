//! Bulk retrieval of planned frames with per-frame retry.

use std::{
	path::{Path, PathBuf},
	time::Duration,
};

use serde::Serialize;

use guard_config::ObjectStore;

use crate::{FetchError, GuardService, ObjectFetcher, RetrievalPlan};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameStatus {
	Downloaded { bytes: u64 },
	Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameOutcome {
	pub scenario: usize,
	pub frame: String,
	pub location: String,
	pub destination: PathBuf,
	pub attempts: u32,
	#[serde(flatten)]
	pub status: FrameStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
	pub outcomes: Vec<FrameOutcome>,
	pub succeeded: usize,
	pub failed: usize,
}
impl DownloadReport {
	fn push(&mut self, outcome: FrameOutcome) {
		match outcome.status {
			FrameStatus::Downloaded { .. } => self.succeeded += 1,
			FrameStatus::Failed { .. } => self.failed += 1,
		}

		self.outcomes.push(outcome);
	}

	pub fn failures(&self) -> impl Iterator<Item = &FrameOutcome> + '_ {
		self.outcomes.iter().filter(|outcome| matches!(outcome.status, FrameStatus::Failed { .. }))
	}
}

impl GuardService {
	pub async fn download(&self, plan: &RetrievalPlan) -> DownloadReport {
		download_plan(self.fetcher.as_ref(), &self.cfg.storage.object_store, plan).await
	}
}

/// Local path for one frame: `{download_dir}/{collector}/{seq}/scenario_{index:04}/{frame}.{ext}`.
///
/// Named by frame so distinct frames never share a file; the extension comes from `location`.
pub fn destination_for(
	download_dir: &Path,
	collector_id: &str,
	collection_seq: &str,
	scenario: usize,
	location: &str,
	frame: &str,
) -> PathBuf {
	let mut file_name = PathBuf::from(frame);

	if let Some(extension) = Path::new(location).extension() {
		file_name.set_extension(extension);
	}

	download_dir
		.join(collector_id)
		.join(collection_seq)
		.join(format!("scenario_{scenario:04}"))
		.join(file_name)
}

/// Delay before retry number `retry` (1-based): doubles from `base_ms`, capped at `max_ms`.
pub fn backoff_delay(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
	let factor = 1_u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);

	Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

/// Fetches every planned location in plan order.
///
/// Each frame is retried on its own; a failure is recorded in the report and never stops the
/// remaining frames.
pub async fn download_plan(
	fetcher: &dyn ObjectFetcher,
	cfg: &ObjectStore,
	plan: &RetrievalPlan,
) -> DownloadReport {
	let mut report = DownloadReport::default();

	for scenario in &plan.scenarios {
		for entry in &scenario.locations {
			let destination = destination_for(
				&cfg.download_dir,
				&scenario.collector_id,
				&scenario.collection_seq,
				scenario.index,
				&entry.location,
				&entry.frame,
			);
			let (attempts, result) =
				fetch_with_retry(fetcher, cfg, &entry.location, &destination).await;
			let status = match result {
				Ok(bytes) => FrameStatus::Downloaded { bytes },
				Err(err) => {
					tracing::warn!(
						location = %entry.location,
						attempts,
						error = %err,
						"Frame download failed."
					);

					FrameStatus::Failed { error: err.message }
				},
			};

			report.push(FrameOutcome {
				scenario: scenario.index,
				frame: entry.frame.clone(),
				location: entry.location.clone(),
				destination,
				attempts,
				status,
			});
		}
	}

	tracing::info!(succeeded = report.succeeded, failed = report.failed, "Download finished.");

	report
}

async fn fetch_with_retry(
	fetcher: &dyn ObjectFetcher,
	cfg: &ObjectStore,
	location: &str,
	destination: &Path,
) -> (u32, Result<u64, FetchError>) {
	let max_attempts = cfg.max_attempts.max(1);
	let mut attempt = 1;

	loop {
		match fetcher.fetch(location, destination).await {
			Ok(bytes) => return (attempt, Ok(bytes)),
			Err(err) if err.retryable && attempt < max_attempts => {
				let delay = backoff_delay(attempt, cfg.base_backoff_ms, cfg.max_backoff_ms);

				tracing::debug!(
					%location,
					attempt,
					delay_ms = delay.as_millis() as u64,
					error = %err,
					"Retrying frame download."
				);
				tokio::time::sleep(delay).await;

				attempt += 1;
			},
			Err(err) => return (attempt, Err(err)),
		}
	}
}
