use crate::search::{SearchDiagnostics, Stage};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// The document store failed mid-pipeline. Carries everything observed up to `stage`.
	#[error("Retrieval failed during {stage}: {message}")]
	RetrievalFailed { stage: Stage, message: String, diagnostics: Box<SearchDiagnostics> },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}

impl From<atlas_storage::Error> for Error {
	fn from(err: atlas_storage::Error) -> Self {
		match err {
			atlas_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			atlas_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<atlas_providers::Error> for Error {
	fn from(err: atlas_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
