pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Vector index error: {message}")]
	VectorIndex { message: String },
	#[error("Lexical search error: {message}")]
	Lexical { message: String },
	#[error("Internal error: {message}")]
	Internal { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}
}

impl From<kbs_providers::Error> for Error {
	fn from(err: kbs_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<kbs_storage::Error> for Error {
	fn from(err: kbs_storage::Error) -> Self {
		match err {
			kbs_storage::Error::Qdrant(err) => Self::VectorIndex { message: err.to_string() },
			err => Self::Storage { message: err.to_string() },
		}
	}
}
