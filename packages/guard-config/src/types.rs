use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub scenario: Scenario,
	#[serde(default)]
	pub ingest: Ingest,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub object_store: ObjectStore,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStore {
	/// Base URL of the object store, without a trailing slash after normalization.
	pub endpoint: String,
	pub bucket: String,
	pub timeout_ms: u64,
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_base_backoff_ms")]
	pub base_backoff_ms: u64,
	#[serde(default = "default_max_backoff_ms")]
	pub max_backoff_ms: u64,
	pub download_dir: PathBuf,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scenario {
	/// Zero-padded width of frame identifiers within a recording session.
	pub frame_width: u32,
	/// One of "drop" or "window".
	pub single_frame: String,
	/// Frames retrieved on each side of a single-sample scenario when `single_frame = "window"`.
	pub single_frame_window: u64,
}
impl Default for Scenario {
	fn default() -> Self {
		Self { frame_width: 10, single_frame: "drop".to_string(), single_frame_window: 0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ingest {
	/// Detection runs on every `drop_rate`-th captured frame.
	pub drop_rate: u32,
}
impl Default for Ingest {
	fn default() -> Self {
		Self { drop_rate: 6 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_attempts() -> u32 {
	3
}

fn default_base_backoff_ms() -> u64 {
	200
}

fn default_max_backoff_ms() -> u64 {
	5_000
}
