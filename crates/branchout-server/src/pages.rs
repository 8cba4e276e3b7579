//! Page handlers.
//!
//! Pages answer with JSON view models for a front end to render; every page
//! but `/` requires a logged-in student.

use axum::{
  Json,
  extract::{Multipart, Query, State},
  response::{IntoResponse, Redirect, Response},
};
use branchout_core::{
  message::UnreadSummary,
  prompt::{MatchSummary, Prompt},
  store::{DirectoryFilter, DirectoryStore},
  student::{ProfileUpdate, StudentId, StudentProfile},
  tag::{Tag, TagKind},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
  AppState,
  auth::CurrentStudent,
  error::{Error, Result},
  session::{STUDENT_ID, set_notice, take_notice},
  upload,
};

// ─── View models ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IndexPage {
  pub app_name: String,
  pub notice:   Option<String>,
}

/// Every known tag, for pick lists.
#[derive(Debug, Serialize)]
pub struct TagOptions {
  pub interests: Vec<Tag>,
  pub clubs:     Vec<Tag>,
  pub languages: Vec<Tag>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
  pub app_name: String,
  pub student:  StudentProfile,
  #[serde(flatten)]
  pub options:  TagOptions,
  pub notice:   Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryPage {
  pub app_name:        String,
  pub current_student: StudentProfile,
  pub students:        Vec<StudentProfile>,
  #[serde(flatten)]
  pub options:         TagOptions,
  pub faculties:       Vec<String>,
  pub notice:          Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchesPage {
  pub app_name:        String,
  pub current_student: StudentProfile,
  /// Everyone, for the candidate picker.
  pub students:        Vec<StudentProfile>,
  pub prompts:         Vec<Prompt>,
  /// Matches the current student has submitted.
  pub matches:         Vec<MatchSummary>,
  pub notice:          Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagesPage {
  pub app_name:        String,
  pub current_student: StudentProfile,
  /// The conversation partner, when `other_id` names a student.
  pub other_student:   Option<StudentProfile>,
  pub students:        Vec<StudentProfile>,
  pub unread:          Vec<UnreadSummary>,
  pub notice:          Option<String>,
}

async fn tag_options<S: DirectoryStore>(store: &S) -> Result<TagOptions> {
  Ok(TagOptions {
    interests: store.list_tags(TagKind::Interest).await.map_err(Error::store)?,
    clubs:     store.list_tags(TagKind::Club).await.map_err(Error::store)?,
    languages: store.list_tags(TagKind::Language).await.map_err(Error::store)?,
  })
}

async fn all_students<S: DirectoryStore>(store: &S) -> Result<Vec<StudentProfile>> {
  store
    .filter_students(&DirectoryFilter::default())
    .await
    .map_err(Error::store)
}

/// Pages show the logged-in student; `student_id` may only repeat them.
fn check_student_param(student: StudentId, requested: Option<StudentId>) -> Result<()> {
  match requested {
    Some(id) if id != student => {
      Err(Error::Forbidden(format!("student {id} is not the logged-in student")))
    }
    _ => Ok(()),
  }
}

async fn profile_of<S: DirectoryStore>(store: &S, id: StudentId) -> Result<StudentProfile> {
  store
    .get_profile(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// `GET /`: logged-in students go straight to the directory.
pub async fn index<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Response>
where
  S: DirectoryStore + Clone + 'static,
{
  if session.get::<StudentId>(STUDENT_ID).await?.is_some() {
    return Ok(Redirect::to("/directory").into_response());
  }
  Ok(
    Json(IndexPage {
      app_name: state.config.app_name.clone(),
      notice:   take_notice(&session).await?,
    })
    .into_response(),
  )
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  CurrentStudent(student): CurrentStudent,
  session: Session,
) -> Result<Json<ProfilePage>>
where
  S: DirectoryStore + Clone + 'static,
{
  Ok(Json(ProfilePage {
    app_name: state.config.app_name.clone(),
    student:  profile_of(state.store.as_ref(), student.id).await?,
    options:  tag_options(state.store.as_ref()).await?,
    notice:   take_notice(&session).await?,
  }))
}

/// A picture part from the profile form.
struct Picture {
  filename: String,
  bytes:    Vec<u8>,
}

/// Collect the multipart profile form. Tag fields may repeat.
async fn read_profile_form(
  mut multipart: Multipart,
) -> Result<(ProfileUpdate, Option<Picture>)> {
  let mut update = ProfileUpdate::default();
  let mut year = None;
  let mut picture = None;

  while let Some(field) = multipart.next_field().await? {
    let Some(name) = field.name().map(str::to_owned) else {
      continue;
    };
    match name.as_str() {
      "profile_picture" => {
        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await?;
        if !filename.is_empty() && !bytes.is_empty() {
          picture = Some(Picture { filename, bytes: bytes.to_vec() });
        }
      }
      "name" => update.name = field.text().await?,
      "faculty" => update.faculty = field.text().await?,
      "year" => year = Some(field.text().await?),
      other => {
        let Ok(kind) = other.parse::<TagKind>() else {
          continue;
        };
        let value = field.text().await?;
        update.tags_mut(kind).push(value);
      }
    }
  }

  let year = year.unwrap_or_default();
  update.year = year
    .trim()
    .parse()
    .map_err(|_| Error::BadRequest(format!("year must be a number, got {year:?}")))?;

  Ok((update, picture))
}

/// `POST /profile`: apply the submitted profile, then 303 to `/directory`.
///
/// Pictures with an unaccepted extension are ignored and the current
/// picture is kept.
pub async fn submit_profile<S>(
  State(state): State<AppState<S>>,
  CurrentStudent(student): CurrentStudent,
  session: Session,
  multipart: Multipart,
) -> Result<Redirect>
where
  S: DirectoryStore + Clone + 'static,
{
  let (update, picture) = read_profile_form(multipart).await?;
  // Rejected forms must not leave a picture behind.
  let mut update = update.validate().map_err(Error::store)?;

  if let Some(picture) = picture {
    if picture.bytes.len() > upload::MAX_PICTURE_BYTES {
      tracing::warn!(student_id = student.id, size = picture.bytes.len(), "picture too large");
      return Err(Error::BadRequest("profile picture must be 16 MiB or smaller".into()));
    }
    match upload::allowed_extension(&picture.filename) {
      Some(ext) => {
        let url =
          upload::save_picture(&state.config.upload_dir, &ext, &picture.bytes).await?;
        update.profile_picture = Some(url);
      }
      None => {
        tracing::warn!(
          student_id = student.id,
          filename = %picture.filename,
          "ignoring picture with unsupported extension"
        );
      }
    }
  }

  let saved = update.profile_picture.clone();
  let profile = match state.store.update_profile(student.id, update).await {
    Ok(profile) => profile,
    Err(e) => {
      if let Some(url) = saved {
        upload::remove_picture(&state.config.upload_dir, &url).await;
      }
      return Err(Error::store(e));
    }
  };

  tracing::info!(student_id = profile.id, "profile updated");
  set_notice(&session, format!("Welcome, {}!", profile.name)).await?;
  Ok(Redirect::to("/directory"))
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// `GET /directory`
pub async fn directory<S>(
  State(state): State<AppState<S>>,
  CurrentStudent(student): CurrentStudent,
  session: Session,
) -> Result<Json<DirectoryPage>>
where
  S: DirectoryStore + Clone + 'static,
{
  let store = state.store.as_ref();
  let students = all_students(store).await?;

  Ok(Json(DirectoryPage {
    app_name:        state.config.app_name.clone(),
    current_student: profile_of(store, student.id).await?,
    students,
    options:         tag_options(store).await?,
    faculties:       store.list_faculties().await.map_err(Error::store)?,
    notice:          take_notice(&session).await?,
  }))
}

// ─── Matches & messages ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub student_id: Option<StudentId>,
  pub other_id:   Option<StudentId>,
}

/// `GET /matches`
pub async fn matches<S>(
  State(state): State<AppState<S>>,
  CurrentStudent(student): CurrentStudent,
  session: Session,
  Query(params): Query<PageParams>,
) -> Result<Json<MatchesPage>>
where
  S: DirectoryStore + Clone + 'static,
{
  check_student_param(student.id, params.student_id)?;
  let store = state.store.as_ref();

  Ok(Json(MatchesPage {
    app_name:        state.config.app_name.clone(),
    current_student: profile_of(store, student.id).await?,
    students:        all_students(store).await?,
    prompts:         store.list_prompts().await.map_err(Error::store)?,
    matches:         store.matches_for(student.id).await.map_err(Error::store)?,
    notice:          take_notice(&session).await?,
  }))
}

/// `GET /messages?other_id=<id>`
///
/// Only lists who has written; the conversation itself is fetched through
/// the API so that opening the page does not mark anything read.
pub async fn messages<S>(
  State(state): State<AppState<S>>,
  CurrentStudent(student): CurrentStudent,
  session: Session,
  Query(params): Query<PageParams>,
) -> Result<Json<MessagesPage>>
where
  S: DirectoryStore + Clone + 'static,
{
  check_student_param(student.id, params.student_id)?;
  let store = state.store.as_ref();

  let other_student = match params.other_id {
    Some(id) => store.get_profile(id).await.map_err(Error::store)?,
    None => None,
  };

  Ok(Json(MessagesPage {
    app_name: state.config.app_name.clone(),
    current_student: profile_of(store, student.id).await?,
    other_student,
    students: all_students(store).await?,
    unread: store.unread_summary(student.id).await.map_err(Error::store)?,
    notice: take_notice(&session).await?,
  }))
}
