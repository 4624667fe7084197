pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("GUARD_PG_DSN is not a valid Postgres DSN: {0}")]
	InvalidDsn(sqlx::Error),
	#[error("No admin database accepted a connection. Last error: {0}")]
	AdminUnavailable(sqlx::Error),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
