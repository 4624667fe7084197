mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Ingest, ObjectStore, Postgres, Scenario, Service, Storage};

use std::{fs, path::Path};

/// Largest frame width whose zero-padded values still fit a `u64`.
pub const MAX_FRAME_WIDTH: u32 = 19;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	let object_store = &cfg.storage.object_store;

	for (label, value) in [
		("storage.object_store.endpoint", &object_store.endpoint),
		("storage.object_store.bucket", &object_store.bucket),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if object_store.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.object_store.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if object_store.max_attempts == 0 {
		return Err(Error::Validation {
			message: "storage.object_store.max_attempts must be greater than zero.".to_string(),
		});
	}
	if object_store.base_backoff_ms > object_store.max_backoff_ms {
		return Err(Error::Validation {
			message:
				"storage.object_store.base_backoff_ms must not exceed storage.object_store.max_backoff_ms."
					.to_string(),
		});
	}
	if object_store.download_dir.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.object_store.download_dir must be non-empty.".to_string(),
		});
	}

	for (key, value) in &object_store.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("storage.object_store.default_headers.{key} must be a string."),
			});
		}
	}

	if !(1..=MAX_FRAME_WIDTH).contains(&cfg.scenario.frame_width) {
		return Err(Error::Validation {
			message: format!("scenario.frame_width must be in the range 1-{MAX_FRAME_WIDTH}."),
		});
	}
	// Within 1..=MAX_FRAME_WIDTH, so the power fits a u64.
	let frame_limit = 10_u64.pow(cfg.scenario.frame_width);

	if cfg.scenario.single_frame_window >= frame_limit {
		return Err(Error::Validation {
			message: format!(
				"scenario.single_frame_window must be less than {frame_limit} for frame_width {}.",
				cfg.scenario.frame_width
			),
		});
	}
	if !matches!(cfg.scenario.single_frame.as_str(), "drop" | "window") {
		return Err(Error::Validation {
			message: "scenario.single_frame must be one of drop or window.".to_string(),
		});
	}
	if cfg.ingest.drop_rate == 0 {
		return Err(Error::Validation {
			message: "ingest.drop_rate must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let endpoint = cfg.storage.object_store.endpoint.trim().trim_end_matches('/');

	cfg.storage.object_store.endpoint = endpoint.to_string();
	cfg.storage.object_store.bucket = cfg.storage.object_store.bucket.trim().to_string();
	cfg.scenario.single_frame = cfg.scenario.single_frame.trim().to_ascii_lowercase();
}
