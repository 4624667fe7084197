use std::{path::Path, time::Duration};

use reqwest::Client;
use tokio::{fs, io::AsyncWriteExt};

use crate::{Error, Result};

/// Object store reachable over plain HTTP GET at `{endpoint}/{bucket}/{location}`.
pub struct HttpObjectStore {
	client: Client,
	endpoint: String,
	bucket: String,
}
impl HttpObjectStore {
	pub fn new(cfg: &guard_config::ObjectStore) -> Result<Self> {
		if cfg.endpoint.trim().is_empty() || cfg.bucket.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "Object store endpoint and bucket must be non-empty.".to_string(),
			});
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::default_headers(&cfg.default_headers)?)
			.build()?;

		Ok(Self {
			client,
			endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
			bucket: cfg.bucket.clone(),
		})
	}

	pub fn object_url(&self, location: &str) -> String {
		format!("{}/{}/{}", self.endpoint, self.bucket, location.trim_start_matches('/'))
	}

	/// Streams one object to `destination` and returns the number of bytes written.
	///
	/// The body lands in a `.part` sibling first and is renamed into place once complete, so a
	/// failed transfer never leaves a truncated file under the final name.
	pub async fn download(&self, location: &str, destination: &Path) -> Result<u64> {
		let url = self.object_url(location);
		let mut res = self.client.get(&url).send().await?.error_for_status()?;

		if let Some(parent) = destination.parent() {
			fs::create_dir_all(parent).await?;
		}

		let partial = destination.with_extension("part");
		let mut file = fs::File::create(&partial).await?;
		let mut written = 0_u64;

		while let Some(chunk) = res.chunk().await? {
			file.write_all(&chunk).await?;

			written += chunk.len() as u64;
		}

		file.flush().await?;

		drop(file);

		fs::rename(&partial, destination).await?;

		tracing::debug!(%url, bytes = written, "Downloaded object.");

		Ok(written)
	}
}
