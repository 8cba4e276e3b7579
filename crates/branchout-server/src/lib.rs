//! The BranchOut web server.
//!
//! Wires the session layer, Google OAuth and email login, the profile,
//! directory, matches and messages pages, uploaded-picture serving, and the
//! JSON API from [`branchout_api`] into one axum [`Router`].

pub mod auth;
pub mod error;
pub mod oauth;
pub mod pages;
pub mod session;
pub mod upload;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post},
};
use branchout_core::store::DirectoryStore;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

use oauth::GoogleOAuth;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BRANCHOUT_*` environment variables. Every field has a default.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                       String,
  pub port:                       u16,
  /// Display name handed to every page.
  pub app_name:                   String,
  pub database_path:              PathBuf,
  /// Where uploaded profile pictures are written; served under `/uploads`.
  pub upload_dir:                 PathBuf,
  /// Public origin, used to build the OAuth redirect URI.
  pub base_url:                   String,
  pub google_client_id:           Option<String>,
  pub google_client_secret:       Option<String>,
  pub oauth_timeout_secs:         u64,
  /// Enables `POST /login/email`, which trusts the submitted address.
  pub allow_email_login:          bool,
  pub require_login_for_api:      bool,
  pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                       "127.0.0.1".to_owned(),
      port:                       8080,
      app_name:                   "BranchOut".to_owned(),
      database_path:              PathBuf::from("branchout.db"),
      upload_dir:                 PathBuf::from("uploads"),
      base_url:                   "http://localhost:8080".to_owned(),
      google_client_id:           None,
      google_client_secret:       None,
      oauth_timeout_secs:         10,
      allow_email_login:          false,
      require_login_for_api:      true,
      session_inactivity_minutes: 120,
    }
  }
}

impl ServerConfig {
  /// Session cookies carry `Secure` when the site is served over https.
  pub fn secure_cookies(&self) -> bool { self.base_url.starts_with("https://") }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all page handlers.
#[derive(Clone)]
pub struct AppState<S: DirectoryStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  /// `None` when Google sign-in is not configured.
  pub oauth:  Option<GoogleOAuth>,
}

impl<S: DirectoryStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Result<Self, Error> {
    let oauth = GoogleOAuth::from_config(&config)?;
    Ok(Self {
      store: Arc::new(store),
      config: Arc::new(config),
      oauth,
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router, including the session layer.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DirectoryStore + Clone + 'static,
{
  let sessions = SessionManagerLayer::new(MemoryStore::default())
    .with_secure(state.config.secure_cookies())
    .with_same_site(SameSite::Lax)
    .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
      state.config.session_inactivity_minutes,
    )));

  let mut api = branchout_api::api_router(state.store.clone());
  if state.config.require_login_for_api {
    api = api.layer(middleware::from_fn(auth::require_session));
  }

  let uploads = ServeDir::new(&state.config.upload_dir);

  Router::new()
    .route("/", get(pages::index::<S>))
    .route("/login", get(auth::login::<S>))
    .route("/authorize", get(auth::authorize::<S>))
    .route("/login/email", post(auth::email_login::<S>))
    .route("/logout", get(auth::logout))
    .route(
      "/profile",
      get(pages::profile::<S>)
        .post(pages::submit_profile::<S>)
        .layer(DefaultBodyLimit::max(upload::MAX_REQUEST_BYTES)),
    )
    .route("/directory", get(pages::directory::<S>))
    .route("/matches", get(pages::matches::<S>))
    .route("/messages", get(pages::messages::<S>))
    .with_state(state)
    .nest_service("/uploads", uploads)
    .nest("/api", api)
    .layer(sessions)
    .layer(TraceLayer::new_for_http())
}
