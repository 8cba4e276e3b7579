//! Handlers for `/matches`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/matches?user_id=` | Matches submitted by the user |
//! | `POST` | `/matches` | Body: [`CreateBody`]; returns 201 + [`MatchSummary`] |
//!
//! `user_id` and `submitted_by` default to the logged-in student, if any.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use branchout_core::{
  prompt::{MatchSummary, NewMatch, PromptKind, PromptRef},
  store::DirectoryStore,
  student::{StudentId, StudentRef},
};
use serde::Deserialize;

use crate::{actor::Actor, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_id: Option<StudentId>,
}

/// `GET /matches?user_id=<id>`
pub async fn list<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<MatchSummary>>, ApiError> {
  let user_id = actor.resolve(params.user_id, "user_id")?;
  let matches = store.matches_for(user_id).await.map_err(ApiError::store)?;
  Ok(Json(matches))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /matches`.
///
/// The prompt is named either by a built-in `prompt_type` or by a stored
/// `prompt_id`; the candidate by id or by exact display name.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub submitted_by:      Option<StudentId>,
  pub prompt_type:       Option<String>,
  pub prompt_id:         Option<i64>,
  pub matched_user_id:   Option<StudentId>,
  pub matched_user_name: Option<String>,
}

impl CreateBody {
  /// Build the match input, acting for `actor`.
  pub fn into_new_match(self, actor: Actor) -> Result<NewMatch, ApiError> {
    let submitted_by = actor.resolve(self.submitted_by, "submitted_by")?;

    let builtin = self
      .prompt_type
      .as_deref()
      .map(PromptKind::from_tag)
      .filter(|k| k.is_builtin());
    let prompt = match (builtin, self.prompt_id) {
      (Some(kind), _) => PromptRef::Builtin(kind),
      (None, Some(id)) => PromptRef::Id(id),
      (None, None) => return Err(ApiError::missing("prompt_type or prompt_id")),
    };

    let matched_user = match (self.matched_user_id, self.matched_user_name) {
      (Some(id), _) => StudentRef::Id(id),
      (None, Some(name)) if !name.trim().is_empty() => {
        StudentRef::Name(name.trim().to_owned())
      }
      _ => return Err(ApiError::missing("matched_user_id or matched_user_name")),
    };

    Ok(NewMatch { prompt, matched_user, submitted_by })
  }
}

/// `POST /matches`
pub async fn create<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body.into_new_match(actor)?;
  let summary = store.create_match(input).await.map_err(ApiError::store)?;
  tracing::info!(
    match_id = summary.id,
    prompt_id = summary.prompt_id,
    submitted_by = summary.submitted_by,
    "match recorded"
  );
  Ok((StatusCode::CREATED, Json(summary)))
}
