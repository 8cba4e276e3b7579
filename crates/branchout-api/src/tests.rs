//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Extension,
  body::Body,
  http::{Request, StatusCode, header},
};
use branchout_core::{
  store::DirectoryStore,
  student::{ExternalIdentity, ProfileUpdate, StudentId},
};
use branchout_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{SessionStudent, api_router};

async fn make_store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.unwrap())
}

async fn add_student(
  store: &SqliteStore,
  name: &str,
  year: i64,
  faculty: &str,
  interests: &[&str],
  languages: &[&str],
) -> StudentId {
  let id = store
    .resolve_identity(ExternalIdentity::from_email(format!("{name}@uni.test"), None))
    .await
    .unwrap()
    .id;
  store
    .update_profile(id, ProfileUpdate {
      name: name.into(),
      year,
      faculty: faculty.into(),
      interests: interests.iter().map(|s| s.to_string()).collect(),
      languages: languages.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    })
    .await
    .unwrap();
  id
}

async fn send(
  store: &Arc<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  send_as(store, None, method, uri, body).await
}

/// Like [`send`], with `actor` attached the way an authenticating host
/// attaches the logged-in student.
async fn send_as(
  store: &Arc<SqliteStore>,
  actor: Option<StudentId>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let mut router = api_router(store.clone());
  if let Some(id) = actor {
    router = router.layer(Extension(SessionStudent(id)));
  }
  let resp = router
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_missing_student_is_404_with_error_body() {
  let store = make_store().await;
  let (status, body) = send(&store, "GET", "/students/42", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn filter_by_faculty_and_interest() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 2, "Science", &["Chess"], &[]).await;
  add_student(&store, "Bob", 2, "Science", &["Music"], &[]).await;
  add_student(&store, "Cy", 2, "Arts", &["Chess"], &[]).await;

  let (status, body) = send(
    &store,
    "POST",
    "/filter",
    Some(json!({ "faculty": "Science", "interests": ["Chess"] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["id"], ada);
  assert_eq!(rows[0]["interests"], json!(["Chess"]));
}

#[tokio::test]
async fn empty_filter_lists_everyone() {
  let store = make_store().await;
  add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  add_student(&store, "Bob", 1, "Arts", &[], &[]).await;

  let (_, body) = send(&store, "POST", "/filter", Some(json!({}))).await;
  assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn validate_name_forces_the_users_faculty() {
  let store = make_store().await;
  add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  add_student(&store, "Bob", 1, "Science", &[], &[]).await;
  add_student(&store, "Cy", 1, "Arts", &[], &[]).await;

  let (_, ok) = send(
    &store,
    "POST",
    "/validate-name",
    Some(json!({ "name": "Bob", "user_name": "Ada", "filters": { "faculty": "Arts" } })),
  )
  .await;
  assert_eq!(ok["valid"], true);
  assert_eq!(ok["student"]["name"], "Bob");

  let (_, rejected) = send(
    &store,
    "POST",
    "/validate-name",
    Some(json!({ "name": "Cy", "user_name": "Ada" })),
  )
  .await;
  assert_eq!(rejected["valid"], false);
  assert!(rejected.get("student").is_none());
}

#[tokio::test]
async fn unknown_tag_kind_is_400() {
  let store = make_store().await;
  let (status, body) = send(&store, "GET", "/tags/sports", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("sports"));

  let (status, _) = send(&store, "GET", "/tags/clubs", None).await;
  assert_eq!(status, StatusCode::OK);
}

// ─── Prompts & matches ───────────────────────────────────────────────────────

#[tokio::test]
async fn candidates_for_unknown_prompt_type_are_everyone_else() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  add_student(&store, "Bob", 2, "Arts", &[], &[]).await;

  let (status, body) = send(
    &store,
    "POST",
    "/candidates",
    Some(json!({ "student_id": ada, "prompt_type": "most_helpful" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["prompt_type"], "custom");
  let names: Vec<_> = body["candidates"]
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["name"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, vec!["Bob"]);
}

#[tokio::test]
async fn missing_prerequisite_is_400() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;

  let (status, body) = send(
    &store,
    "POST",
    "/candidates",
    Some(json!({ "student_id": ada, "prompt_type": "same_language_and_hobby" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("language"));
}

#[tokio::test]
async fn match_by_name_then_duplicate() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &["Chess"], &["French"]).await;
  let bob = add_student(&store, "Bob", 3, "Science", &["Chess"], &["French"]).await;

  let body = json!({
    "submitted_by": ada,
    "prompt_type": "same_language_and_hobby",
    "matched_user_name": "Bob",
  });

  let (status, created) = send(&store, "POST", "/matches", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["matched_user_id"], bob);
  assert_eq!(created["matched_user_name"], "Bob");

  let (status, dup) = send(&store, "POST", "/matches", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(dup["error"].as_str().unwrap().contains("already"));

  let (_, list) = send(&store, "GET", &format!("/matches?user_id={ada}"), None).await;
  assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn match_against_rule_is_400_and_unknown_name_is_404() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  add_student(&store, "Cy", 1, "Arts", &[], &[]).await;

  let (status, body) = send(
    &store,
    "POST",
    "/matches",
    Some(json!({ "submitted_by": ada, "prompt_type": "same_faculty", "matched_user_name": "Cy" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("(Science)"));

  let (status, _) = send(
    &store,
    "POST",
    "/matches",
    Some(json!({ "submitted_by": ada, "prompt_type": "same_faculty", "matched_user_name": "Zed" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn match_without_prompt_is_400() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  let (status, body) = send(
    &store,
    "POST",
    "/matches",
    Some(json!({ "submitted_by": ada, "matched_user_name": "Ada" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn custom_prompt_flow() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  let cy = add_student(&store, "Cy", 2, "Arts", &[], &[]).await;

  let (status, prompt) = send(
    &store,
    "POST",
    "/prompts",
    Some(json!({ "text": "Best lab partner", "created_by": ada })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(prompt["kind"], "custom");

  let (status, _) = send(
    &store,
    "POST",
    "/matches",
    Some(json!({ "submitted_by": ada, "prompt_id": prompt["id"], "matched_user_id": cy })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, prompts) = send(&store, "GET", "/prompts", None).await;
  assert_eq!(prompts.as_array().unwrap().len(), 1);
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn message_round_trip_updates_unread() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  let bob = add_student(&store, "Bob", 1, "Science", &[], &[]).await;

  let (status, sent) = send(
    &store,
    "POST",
    "/messages",
    Some(json!({ "sender_id": ada, "receiver_id": bob, "content": "hi" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(sent["read"], false);

  let (_, unread) = send(&store, "GET", &format!("/unread?user_id={bob}"), None).await;
  assert_eq!(unread, json!([{ "sender_id": ada, "sender_name": "Ada", "count": 1 }]));

  let uri = format!("/messages?user_id={bob}&other_id={ada}");
  let (_, conversation) = send(&store, "GET", &uri, None).await;
  assert_eq!(conversation[0]["read"], true);

  let (_, unread) = send(&store, "GET", &format!("/unread?user_id={bob}"), None).await;
  assert_eq!(unread, json!([]));
}

#[tokio::test]
async fn blank_message_and_missing_params_are_400() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  let bob = add_student(&store, "Bob", 1, "Science", &[], &[]).await;

  let (status, _) = send(
    &store,
    "POST",
    "/messages",
    Some(json!({ "sender_id": ada, "receiver_id": bob, "content": "  " })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(&store, "GET", "/unread", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "user_id is required");
}

// ─── Session student ─────────────────────────────────────────────────────────

#[tokio::test]
async fn session_student_cannot_act_for_others() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  let bob = add_student(&store, "Bob", 1, "Science", &[], &[]).await;
  let eve = add_student(&store, "Eve", 1, "Science", &[], &[]).await;

  let (status, _) = send_as(
    &store,
    Some(ada),
    "POST",
    "/messages",
    Some(json!({ "receiver_id": bob, "content": "hi" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send_as(
    &store,
    Some(eve),
    "POST",
    "/messages",
    Some(json!({ "sender_id": ada, "receiver_id": bob, "content": "not ada" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(body["error"].as_str().unwrap().contains("sender_id"));

  let uri = format!("/messages?user_id={bob}&other_id={ada}");
  let (status, _) = send_as(&store, Some(eve), "GET", &uri, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send_as(
    &store,
    Some(eve),
    "POST",
    "/matches",
    Some(json!({ "submitted_by": ada, "prompt_type": "same_faculty", "matched_user_id": bob })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  // Bob's message is still unread and Ada has no match on record.
  let (_, unread) = send_as(&store, Some(bob), "GET", "/unread", None).await;
  assert_eq!(unread[0]["count"], 1);
  let (_, list) = send_as(&store, Some(ada), "GET", "/matches", None).await;
  assert_eq!(list, json!([]));
}

#[tokio::test]
async fn session_student_fills_in_omitted_ids() {
  let store = make_store().await;
  let ada = add_student(&store, "Ada", 1, "Science", &[], &[]).await;
  add_student(&store, "Bob", 2, "Science", &[], &[]).await;
  add_student(&store, "Cy", 2, "Arts", &[], &[]).await;

  let (status, body) = send_as(
    &store,
    Some(ada),
    "POST",
    "/candidates",
    Some(json!({ "prompt_type": "same_faculty" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["candidates"].as_array().unwrap().len(), 1);
  assert_eq!(body["candidates"][0]["name"], "Bob");

  let (status, created) = send_as(
    &store,
    Some(ada),
    "POST",
    "/matches",
    Some(json!({ "prompt_type": "same_faculty", "matched_user_name": "Bob" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["submitted_by"], ada);

  // The logged-in student's own faculty wins over `user_name`.
  let (_, check) = send_as(
    &store,
    Some(ada),
    "POST",
    "/validate-name",
    Some(json!({ "name": "Cy", "user_name": "Cy" })),
  )
  .await;
  assert_eq!(check["valid"], false);
}
