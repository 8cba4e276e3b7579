//! Session keys and one-shot notices.

use tower_sessions::Session;

use crate::error::Result;

pub const STUDENT_ID: &str = "student_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const NOTICE: &str = "notice";

/// Store a message to show on the next page that reads it.
pub async fn set_notice(session: &Session, message: impl Into<String>) -> Result<()> {
  session.insert(NOTICE, message.into()).await?;
  Ok(())
}

/// Remove and return the pending notice, if any.
pub async fn take_notice(session: &Session) -> Result<Option<String>> {
  Ok(session.remove::<String>(NOTICE).await?)
}
