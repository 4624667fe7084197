pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl Error {
	/// Whether a later attempt of the same request could succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Reqwest(err) => {
				if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
					return true;
				}

				err.status()
					.map(|status| status.is_server_error() || status.as_u16() == 429)
					.unwrap_or(false)
			},
			Self::Io(_) | Self::InvalidHeaderName(_) | Self::InvalidHeaderValue(_) => false,
			Self::InvalidConfig { .. } => false,
		}
	}
}
