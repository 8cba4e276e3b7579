//! The student a request acts for.
//!
//! A host that authenticates requests inserts [`SessionStudent`] into the
//! request extensions before they reach the API router. Handlers then take
//! the acting student from there; ids in the body or query may only repeat
//! it. Without the extension the router trusts the ids it is given.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use branchout_core::student::StudentId;

use crate::error::ApiError;

/// Request extension naming the logged-in student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStudent(pub StudentId);

/// Extractor over the optional [`SessionStudent`] extension.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Option<StudentId>);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
    Ok(Actor(parts.extensions.get::<SessionStudent>().map(|s| s.0)))
  }
}

impl Actor {
  /// The student `field` refers to.
  ///
  /// With a session the supplied id is optional and must match the session
  /// student (403 otherwise). Without one it is required.
  pub fn resolve(self, supplied: Option<StudentId>, field: &str) -> Result<StudentId, ApiError> {
    match (self.0, supplied) {
      (Some(me), Some(id)) if id != me => Err(ApiError::Forbidden(format!(
        "{field} {id} is not the logged-in student"
      ))),
      (Some(me), _) => Ok(me),
      (None, Some(id)) => Ok(id),
      (None, None) => Err(ApiError::missing(field)),
    }
  }
}
