pub mod download;
pub mod ingest;
pub mod plan;
pub mod query;

mod error;

use std::{future::Future, path::Path, pin::Pin, sync::Arc};

pub use download::{DownloadReport, FrameOutcome, FrameStatus};
pub use error::{Error, Result};
pub use ingest::{IngestReport, IngestRequest, PreparedSession};
pub use plan::{FrameLocation, RetrievalPlan, ScenarioPlan};
pub use query::Retrieval;

use guard_config::Config;
use guard_providers::object_store::HttpObjectStore;
use guard_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Moves one stored object to a local path and reports the bytes written.
pub trait ObjectFetcher
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		location: &'a str,
		destination: &'a Path,
	) -> BoxFuture<'a, Result<u64, FetchError>>;
}

/// A failed fetch attempt, tagged with whether retrying it could help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
	pub message: String,
	pub retryable: bool,
}
impl FetchError {
	pub fn transient(message: impl Into<String>) -> Self {
		Self { message: message.into(), retryable: true }
	}

	pub fn permanent(message: impl Into<String>) -> Self {
		Self { message: message.into(), retryable: false }
	}
}

impl From<guard_providers::Error> for FetchError {
	fn from(err: guard_providers::Error) -> Self {
		Self { retryable: err.is_retryable(), message: err.to_string() }
	}
}

impl ObjectFetcher for HttpObjectStore {
	fn fetch<'a>(
		&'a self,
		location: &'a str,
		destination: &'a Path,
	) -> BoxFuture<'a, Result<u64, FetchError>> {
		Box::pin(async move { Ok(self.download(location, destination).await?) })
	}
}

pub struct GuardService {
	pub cfg: Config,
	pub db: Db,
	pub fetcher: Arc<dyn ObjectFetcher>,
}
impl GuardService {
	/// Builds the service with the HTTP object store described by `cfg`.
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		let store = HttpObjectStore::new(&cfg.storage.object_store)?;

		Ok(Self { cfg, db, fetcher: Arc::new(store) })
	}

	pub fn with_fetcher(cfg: Config, db: Db, fetcher: Arc<dyn ObjectFetcher>) -> Self {
		Self { cfg, db, fetcher }
	}
}
