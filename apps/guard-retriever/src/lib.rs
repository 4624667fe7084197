use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use guard_config::Config;
use guard_domain::{CapturedFrame, SampledDetection, TagPredicate};
use guard_service::{GuardService, IngestRequest};
use guard_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = guard_cli::VERSION,
	rename_all = "kebab",
	styles = guard_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Group matching detections into scenarios and print them.
	Query {
		/// Tag condition as TAG:OP:VALUE, e.g. car:gt:0. Repeat to combine conditions.
		#[arg(long = "tag", short = 't', value_name = "TERM", required = true)]
		tags: Vec<String>,
	},
	/// Query, expand, resolve, and download the dense frames of every scenario.
	Retrieve {
		#[arg(long = "tag", short = 't', value_name = "TERM", required = true)]
		tags: Vec<String>,
		/// Print the retrieval plan without downloading.
		#[arg(long)]
		dry_run: bool,
	},
	/// Store frame locations and sampled detections for one recorded session.
	Ingest {
		#[arg(long, value_name = "ID")]
		collector_id: String,
		#[arg(long, value_name = "SEQ")]
		collection_seq: String,
		/// JSON array of detector outputs.
		#[arg(long, value_name = "FILE")]
		detections: PathBuf,
		/// JSON array of captured frames and their object locations.
		#[arg(long, value_name = "FILE")]
		frames: PathBuf,
		#[arg(long, value_name = "N")]
		drop_rate: Option<u32>,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = guard_config::load(&args.config)?;

	init_tracing(&config)?;

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = GuardService::new(config, db)?;
	let output = execute(&service, args.command).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

async fn execute(service: &GuardService, command: Command) -> color_eyre::Result<Value> {
	match command {
		Command::Query { tags } => {
			let predicate = TagPredicate::parse_terms(tags.as_slice())?;
			let scenarios = service
				.query_scenarios(&predicate)
				.await?
				.ok_or_else(|| eyre::eyre!("At least one --tag is required."))?;

			Ok(serde_json::to_value(scenarios)?)
		},
		Command::Retrieve { tags, dry_run } => {
			let predicate = TagPredicate::parse_terms(tags.as_slice())?;
			let scenarios = service
				.query_scenarios(&predicate)
				.await?
				.ok_or_else(|| eyre::eyre!("At least one --tag is required."))?;
			let plan = service.plan(&scenarios).await?;

			if dry_run {
				return Ok(serde_json::to_value(plan)?);
			}

			let report = service.download(&plan).await;

			if report.failed > 0 {
				tracing::warn!(failed = report.failed, "Some frames could not be downloaded.");
			}

			Ok(serde_json::json!({ "plan": plan, "report": report }))
		},
		Command::Ingest { collector_id, collection_seq, detections, frames, drop_rate } => {
			let req = IngestRequest {
				collector_id,
				collection_seq,
				frames: read_json::<Vec<CapturedFrame>>(&frames)?,
				detections: read_json::<Vec<SampledDetection>>(&detections)?,
				drop_rate,
			};
			let report = service.ingest(req).await?;

			Ok(serde_json::to_value(report)?)
		},
	}
}

fn read_json<T>(path: &Path) -> color_eyre::Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read {}: {err}", path.display()))?;

	Ok(serde_json::from_str(&raw)?)
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
