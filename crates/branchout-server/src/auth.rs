//! Login, logout, and the session-backed current-student extractor.
//!
//! Google OAuth and email login both end in [`DirectoryStore::resolve_identity`];
//! the resulting student id is the only thing kept in the session.

use axum::{
  Form, Json,
  extract::{FromRequestParts, Query, Request, State},
  http::{StatusCode, request::Parts},
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};
use branchout_api::SessionStudent;
use branchout_core::{
  store::DirectoryStore,
  student::{ExternalIdentity, Student, StudentId},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use crate::{
  AppState,
  error::{Error, Result},
  session::{CSRF_STATE, PKCE_VERIFIER, STUDENT_ID, set_notice},
};

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The logged-in student. Rejects with [`Error::Unauthorized`], which
/// redirects to `/login`.
pub struct CurrentStudent(pub Student);

impl<S> FromRequestParts<AppState<S>> for CurrentStudent
where
  S: DirectoryStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = Session::from_request_parts(parts, state)
      .await
      .map_err(|_| Error::Unauthorized)?;
    let id: StudentId = session.get(STUDENT_ID).await?.ok_or(Error::Unauthorized)?;

    // A session can outlive its student row when the database is reset.
    let student = state
      .store
      .get_student(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;
    Ok(CurrentStudent(student))
  }
}

/// Middleware for the JSON API: 401 with an `error` body unless a student is
/// logged in. The student is handed to the API as a [`SessionStudent`], so
/// API calls act for them and no one else.
pub async fn require_session(session: Session, mut req: Request, next: Next) -> Response {
  match session.get::<StudentId>(STUDENT_ID).await {
    Ok(Some(id)) => {
      req.extensions_mut().insert(SessionStudent(id));
      next.run(req).await
    }
    Ok(None) => (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "error": "login required" })),
    )
      .into_response(),
    Err(e) => Error::from(e).into_response(),
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn log_in(session: &Session, student: &Student) -> Result<()> {
  session.cycle_id().await?;
  session.insert(STUDENT_ID, student.id).await?;
  tracing::info!(student_id = student.id, first_login = student.first_login, "student logged in");
  Ok(())
}

/// Where a freshly logged-in student goes next.
fn landing(student: &Student) -> Redirect {
  if student.first_login {
    Redirect::to("/profile")
  } else {
    Redirect::to("/directory")
  }
}

// ─── Google ──────────────────────────────────────────────────────────────────

/// `GET /login`: redirect to Google, or back to `/` with a notice when
/// Google sign-in is not configured.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<Redirect>
where
  S: DirectoryStore + Clone + 'static,
{
  let Some(oauth) = &state.oauth else {
    set_notice(&session, "Google sign-in is not configured on this server.").await?;
    return Ok(Redirect::to("/"));
  };

  let request = oauth.authorize();
  session.insert(CSRF_STATE, request.csrf_state).await?;
  session.insert(PKCE_VERIFIER, request.pkce_verifier).await?;
  Ok(Redirect::to(&request.url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
  pub code:  Option<String>,
  pub state: Option<String>,
  pub error: Option<String>,
}

/// `GET /authorize`: the OAuth callback.
///
/// Failures are logged and turned into a notice on `/`; the provider's
/// error text never reaches the page.
pub async fn authorize<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Query(query): Query<CallbackQuery>,
) -> Result<Redirect>
where
  S: DirectoryStore + Clone + 'static,
{
  match complete_oauth(&state, &session, query).await {
    Ok(student) => {
      log_in(&session, &student).await?;
      Ok(landing(&student))
    }
    Err(e) => {
      tracing::error!(error = %e, "oauth callback failed");
      set_notice(&session, "Google sign-in failed. Please try again.").await?;
      Ok(Redirect::to("/"))
    }
  }
}

async fn complete_oauth<S>(
  state: &AppState<S>,
  session: &Session,
  query: CallbackQuery,
) -> Result<Student>
where
  S: DirectoryStore + Clone + 'static,
{
  let oauth = state
    .oauth
    .as_ref()
    .ok_or_else(|| Error::OAuth("google sign-in is not configured".into()))?;

  if let Some(error) = query.error {
    return Err(Error::OAuth(format!("provider returned {error}")));
  }

  let expected = session.remove::<String>(CSRF_STATE).await?;
  let verifier = session.remove::<String>(PKCE_VERIFIER).await?;
  let (Some(expected), Some(verifier)) = (expected, verifier) else {
    return Err(Error::OAuth("no sign-in in progress".into()));
  };
  if query.state.as_deref() != Some(expected.as_str()) {
    return Err(Error::OAuth("csrf state mismatch".into()));
  }
  let code = query
    .code
    .ok_or_else(|| Error::OAuth("callback without code".into()))?;

  let identity = oauth.exchange(code, verifier).await?;
  state
    .store
    .resolve_identity(identity)
    .await
    .map_err(Error::store)
}

// ─── Email ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmailLoginForm {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub name:  Option<String>,
}

/// `POST /login/email`: log in by address alone, when enabled.
pub async fn email_login<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Form(form): Form<EmailLoginForm>,
) -> Result<Redirect>
where
  S: DirectoryStore + Clone + 'static,
{
  if !state.config.allow_email_login {
    set_notice(&session, "Email sign-in is disabled.").await?;
    return Ok(Redirect::to("/"));
  }

  let email = form.email.trim();
  if !email.contains('@') {
    set_notice(&session, "Please enter a valid email address.").await?;
    return Ok(Redirect::to("/"));
  }

  let name = form.name.filter(|n| !n.trim().is_empty());
  let student = state
    .store
    .resolve_identity(ExternalIdentity::from_email(email, name))
    .await
    .map_err(Error::store)?;

  log_in(&session, &student).await?;
  Ok(landing(&student))
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `GET /logout`
pub async fn logout(session: Session) -> Result<Redirect> {
  session.flush().await?;
  Ok(Redirect::to("/"))
}
