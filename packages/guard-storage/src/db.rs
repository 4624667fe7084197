use sqlx::{PgPool, Postgres, pool::PoolConnection, postgres::PgPoolOptions};

use crate::{Result, schema};

const SCHEMA_LOCK_ID: i64 = 4_827_331;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &guard_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Checks out one connection for a query cycle. It returns to the pool when dropped, on
	/// every exit path.
	pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
		Ok(self.pool.acquire().await?)
	}

	/// Applies the bundled schema. Concurrent callers serialize on a transaction-scoped
	/// advisory lock.
	pub async fn ensure_schema(&self) -> Result<()> {
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		for statement in schema::statements() {
			sqlx::query(&statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
