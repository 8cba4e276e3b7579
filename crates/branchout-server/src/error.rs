//! Error types and axum `IntoResponse` implementation for page handlers.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use branchout_core::{ErrorKind, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No logged-in student; pages answer with a redirect to `/login`.
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("configuration error: {0}")]
  Config(String),
  #[error("oauth error: {0}")]
  OAuth(String),
  #[error("multipart error: {0}")]
  Multipart(#[from] axum::extract::multipart::MultipartError),
  #[error("session error: {0}")]
  Session(#[from] tower_sessions::session::Error),
  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure; rejected input becomes a 400.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.as_core().map(|core| core.kind()) {
      Some(ErrorKind::InvalidInput) => Error::BadRequest(e.to_string()),
      _ => Error::Store(Box::new(e)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => Redirect::to("/login").into_response(),
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
      Error::Multipart(e) => (e.status(), e.body_text()).into_response(),
      e => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
    }
  }
}
