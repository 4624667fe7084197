pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error(transparent)]
	Domain(#[from] guard_domain::Error),
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Object store error: {message}")]
	ObjectStore { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<guard_storage::Error> for Error {
	fn from(err: guard_storage::Error) -> Self {
		match err {
			guard_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			guard_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<guard_providers::Error> for Error {
	fn from(err: guard_providers::Error) -> Self {
		Self::ObjectStore { message: err.to_string() }
	}
}
