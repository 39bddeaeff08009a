use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use atlas_service::{Error, IndexStatus, SearchDiagnostics, SearchRequest, SearchResponse};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/index/status", get(index_status))
		.with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexStatusQuery {
	pub source: Option<String>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn index_status(
	State(state): State<AppState>,
	Query(query): Query<IndexStatusQuery>,
) -> Result<Json<IndexStatus>, ApiError> {
	let response = state.service.index_status(query.source.as_deref()).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	diagnostics: Option<Box<SearchDiagnostics>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	diagnostics: Option<Box<SearchDiagnostics>>,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), diagnostics: None }
	}

	fn with_diagnostics(mut self, diagnostics: Box<SearchDiagnostics>) -> Self {
		self.diagnostics = Some(diagnostics);

		self
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			Error::RetrievalFailed { stage, message, diagnostics } => ApiError::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"retrieval_unavailable",
				format!("Retrieval failed during {stage}: {message}"),
			)
			.with_diagnostics(diagnostics),
			Error::Storage { message } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "storage_error", message),
			Error::Provider { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			diagnostics: self.diagnostics,
		};

		(self.status, Json(body)).into_response()
	}
}
