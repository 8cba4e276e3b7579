//! Handlers for `/prompts` and `/candidates`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/prompts` | Every stored prompt, built-in and custom |
//! | `POST` | `/prompts` | Body: `{"text":"...","created_by":1}`; returns 201 |
//! | `POST` | `/candidates` | Body: `{"student_id":1,"prompt_type":"same_faculty"}` |
//!
//! `created_by` and `student_id` default to the logged-in student, if any.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use branchout_core::{
  prompt::{Prompt, PromptKind},
  store::DirectoryStore,
  student::{StudentId, StudentProfile},
};
use serde::{Deserialize, Serialize};

use crate::{actor::Actor, error::ApiError};

/// `GET /prompts`
pub async fn list<S: DirectoryStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Prompt>>, ApiError> {
  Ok(Json(store.list_prompts().await.map_err(ApiError::store)?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub text:       Option<String>,
  pub created_by: Option<StudentId>,
}

/// `POST /prompts`
pub async fn create<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let text = body.text.ok_or_else(|| ApiError::missing("text"))?;
  let created_by = actor.resolve(body.created_by, "created_by")?;

  let prompt = store
    .create_prompt(text, created_by)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(prompt_id = prompt.id, created_by, "custom prompt created");
  Ok((StatusCode::CREATED, Json(prompt)))
}

// ─── Candidates ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CandidatesBody {
  pub student_id:  Option<StudentId>,
  /// Built-in tag; anything unrecognised is treated as a custom prompt.
  #[serde(default)]
  pub prompt_type: String,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
  pub prompt_type: PromptKind,
  /// The built-in question text, if any.
  pub prompt_text: Option<&'static str>,
  pub candidates:  Vec<StudentProfile>,
}

/// `POST /candidates`
pub async fn candidates<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<CandidatesBody>,
) -> Result<Json<CandidatesResponse>, ApiError> {
  let student_id = actor.resolve(body.student_id, "student_id")?;
  let kind = PromptKind::from_tag(&body.prompt_type);
  let candidates = store
    .candidates(student_id, kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(CandidatesResponse {
    prompt_type: kind,
    prompt_text: kind.builtin_text(),
    candidates,
  }))
}
