//! Handlers for `/messages` and `/unread`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/messages?user_id=&other_id=` | Conversation, oldest first; marks incoming read |
//! | `POST` | `/messages` | Body: `{"sender_id":1,"receiver_id":2,"content":"hi"}`; returns 201 |
//! | `GET`  | `/unread?user_id=` | Unread counts per sender |
//!
//! With a logged-in student, `user_id` and `sender_id` default to that
//! student and may not name anyone else.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use branchout_core::{
  message::{Message, NewMessage, UnreadSummary},
  store::DirectoryStore,
  student::StudentId,
};
use serde::Deserialize;

use crate::{actor::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ConversationParams {
  pub user_id:  Option<StudentId>,
  pub other_id: Option<StudentId>,
}

/// `GET /messages?user_id=<id>&other_id=<id>`
pub async fn fetch<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Query(params): Query<ConversationParams>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let user_id = actor.resolve(params.user_id, "user_id")?;
  let other_id = params.other_id.ok_or_else(|| ApiError::missing("other_id"))?;
  let messages = store
    .fetch_conversation(user_id, other_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub sender_id:   Option<StudentId>,
  pub receiver_id: Option<StudentId>,
  #[serde(default)]
  pub content:     String,
}

/// `POST /messages`
pub async fn send<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewMessage {
    sender_id:   actor.resolve(body.sender_id, "sender_id")?,
    receiver_id: body.receiver_id.ok_or_else(|| ApiError::missing("receiver_id"))?,
    content:     body.content,
  };
  let message = store.send_message(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct UnreadParams {
  pub user_id: Option<StudentId>,
}

/// `GET /unread?user_id=<id>`
pub async fn unread<S: DirectoryStore>(
  State(store): State<Arc<S>>,
  actor: Actor,
  Query(params): Query<UnreadParams>,
) -> Result<Json<Vec<UnreadSummary>>, ApiError> {
  let user_id = actor.resolve(params.user_id, "user_id")?;
  Ok(Json(store.unread_summary(user_id).await.map_err(ApiError::store)?))
}
