//! Handlers for directory endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students` | Every student, by id |
//! | `GET`  | `/students/:id` | 404 if not found |
//! | `POST` | `/filter` | Body: [`FilterBody`] |
//! | `POST` | `/validate-name` | Body: [`ValidateNameBody`] |
//! | `GET`  | `/faculties` | Distinct non-empty faculties |
//! | `GET`  | `/tags/:kind` | `interests`, `clubs`, or `languages` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use branchout_core::{
  store::{DirectoryFilter, DirectoryStore},
  student::{StudentId, StudentProfile},
  tag::{Tag, TagKind},
};
use serde::{Deserialize, Serialize};

use crate::{actor::Actor, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S: DirectoryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<StudentProfile>>, ApiError> {
  let students = store
    .filter_students(&DirectoryFilter::default())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(students))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/:id`
pub async fn get_one<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<StudentId>,
) -> Result<Json<StudentProfile>, ApiError> {
  let profile = store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(profile))
}

// ─── Filter ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /filter`; every facet is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilterBody {
  pub faculty:   Option<String>,
  pub interests: Vec<String>,
  pub clubs:     Vec<String>,
  pub languages: Vec<String>,
}

impl From<FilterBody> for DirectoryFilter {
  fn from(b: FilterBody) -> Self {
    DirectoryFilter {
      faculty:   b.faculty,
      interests: b.interests,
      clubs:     b.clubs,
      languages: b.languages,
      name:      None,
    }
  }
}

/// `POST /filter`
pub async fn filter<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<FilterBody>,
) -> Result<Json<Vec<StudentProfile>>, ApiError> {
  let students = store
    .filter_students(&DirectoryFilter::from(body))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(students))
}

// ─── Validate name ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ValidateNameBody {
  pub name:      String,
  #[serde(default)]
  pub filters:   FilterBody,
  /// When this names an existing student, their faculty replaces the
  /// filter's faculty. Ignored for a logged-in student, whose own faculty
  /// is used.
  #[serde(default)]
  pub user_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateNameResponse {
  pub valid:   bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub student: Option<StudentProfile>,
}

/// `POST /validate-name`: whether a student with exactly `name` passes the
/// given filter.
pub async fn validate_name<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<ValidateNameBody>,
) -> Result<Json<ValidateNameResponse>, ApiError> {
  let mut filter = DirectoryFilter::from(body.filters);

  if let Some(me) = actor.0 {
    let user = store
      .get_student(me)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound(format!("student {me} not found")))?;
    filter.faculty = Some(user.faculty);
  } else if let Some(user_name) = body.user_name.as_deref().filter(|n| !n.trim().is_empty())
    && let Some(user) = store
      .find_student_by_name(user_name)
      .await
      .map_err(ApiError::store)?
  {
    filter.faculty = Some(user.faculty);
  }

  let name = body.name.trim();
  if name.is_empty() {
    return Ok(Json(ValidateNameResponse { valid: false, student: None }));
  }
  filter.name = Some(name.to_owned());

  let student = store
    .filter_students(&filter)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .next();

  Ok(Json(ValidateNameResponse { valid: student.is_some(), student }))
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────

/// `GET /faculties`
pub async fn faculties<S: DirectoryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<String>>, ApiError> {
  Ok(Json(store.list_faculties().await.map_err(ApiError::store)?))
}

/// `GET /tags/:kind`
pub async fn tags<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  Path(kind): Path<String>,
) -> Result<Json<Vec<Tag>>, ApiError> {
  let kind: TagKind = kind
    .parse()
    .map_err(|_| branchout_core::Error::UnknownTagKind(kind))?;
  Ok(Json(store.list_tags(kind).await.map_err(ApiError::store)?))
}
