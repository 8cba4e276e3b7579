//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use branchout_core::{ErrorKind, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request names a student other than the logged-in one.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend failure: domain errors become 400/404 with their own
  /// message, anything else is a 500.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.as_core().map(|core| core.kind()) {
      Some(ErrorKind::NotFound) => ApiError::NotFound(e.to_string()),
      Some(_) => ApiError::BadRequest(e.to_string()),
      None => ApiError::Store(Box::new(e)),
    }
  }

  pub fn missing(field: &str) -> Self {
    ApiError::BadRequest(format!("{field} is required"))
  }
}

impl From<branchout_core::Error> for ApiError {
  fn from(e: branchout_core::Error) -> Self { ApiError::store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
