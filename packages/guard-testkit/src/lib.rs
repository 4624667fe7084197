//! Postgres scratch databases and record fixtures for integration tests.

pub mod fixtures;

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use uuid::Uuid;

pub const DSN_ENV: &str = "GUARD_PG_DSN";

/// Server-level databases tried, in order, for CREATE and DROP DATABASE.
const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A uniquely named database on the server behind `GUARD_PG_DSN`, dropped on cleanup or drop.
pub struct TestDatabase {
	dsn: String,
	name: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn).map_err(Error::InvalidDsn)?;
		let (maintenance, mut conn) = maintenance_connection(&base).await?;
		let name = format!("guard_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { dsn, name, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Pool settings pointing at this database.
	pub fn postgres_config(&self, pool_max_conns: u32) -> guard_config::Postgres {
		guard_config::Postgres { dsn: self.dsn.clone(), pool_max_conns }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.maintenance, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let maintenance = self.maintenance.clone();
		let name = std::mem::take(&mut self.name);
		// The test runtime may already be shutting down, so drop from a fresh one.
		let handle = thread::spawn(move || {
			let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build();
			let outcome = match runtime {
				Ok(runtime) => runtime.block_on(drop_database(&maintenance, &name)),
				Err(err) => Err(Error::Sqlx(sqlx::Error::Io(err))),
			};

			if let Err(err) = outcome {
				eprintln!("Failed to drop test database {name}: {err}.");
			}
		});

		let _ = handle.join();
	}
}

async fn maintenance_connection(
	base: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last = None;

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last = Some(err),
		}
	}

	Err(Error::AdminUnavailable(
		last.unwrap_or_else(|| sqlx::Error::Configuration("no maintenance database".into())),
	))
}

async fn drop_database(maintenance: &PgConnectOptions, name: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Pools from the test may still hold sessions open against the database.
	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;
	conn.close().await?;

	Ok(())
}
