//! [`SqliteStore`], the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use branchout_core::{
  Error as CoreError,
  message::{Message, NewMessage, UnreadSummary},
  prompt::{MatchSummary, NewMatch, Prompt, PromptKind, PromptRef},
  store::{DirectoryFilter, DirectoryStore},
  student::{ExternalIdentity, ProfileUpdate, Student, StudentId, StudentProfile},
  tag::{Tag, TagKind, normalize_names},
};
use rusqlite::{Connection, TransactionBehavior};
use strum::IntoEnumIterator as _;

use crate::{Result, queries, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A BranchOut directory backed by a single SQLite file.
///
/// Cloning is cheap; clones share one background connection, so calls are
/// serialised in the order they arrive.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert the default interest, club, and language names. Safe to run on
  /// every startup.
  pub async fn seed_vocabulary(&self) -> Result<()> {
    self
      .write(|conn| {
        for kind in TagKind::iter() {
          for name in kind.default_vocabulary() {
            queries::get_or_create_tag(conn, kind, name)?;
          }
        }
        Ok(())
      })
      .await
  }

  /// Run `f` on the connection thread. Domain errors from `f` pass through
  /// untouched; only connection-level failures are wrapped.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Like [`Self::read`], inside an `IMMEDIATE` transaction that commits
  /// only if `f` succeeds.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        Ok((|| -> Result<T> {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let out = f(&tx)?;
          tx.commit()?;
          Ok(out)
        })())
      })
      .await?
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Students ──────────────────────────────────────────────────────────────

  async fn resolve_identity(&self, identity: ExternalIdentity) -> Result<Student> {
    let identity = identity.validate()?;
    self
      .write(move |conn| queries::resolve_identity(conn, &identity))
      .await
  }

  async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
    self.read(move |conn| queries::get_student(conn, id)).await
  }

  async fn get_profile(&self, id: StudentId) -> Result<Option<StudentProfile>> {
    self.read(move |conn| queries::get_profile(conn, id)).await
  }

  async fn find_student_by_name(&self, name: &str) -> Result<Option<Student>> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Ok(None);
    }
    self
      .read(move |conn| queries::find_student_by_name(conn, &name))
      .await
  }

  async fn update_profile(
    &self,
    id: StudentId,
    update: ProfileUpdate,
  ) -> Result<StudentProfile> {
    let update = update.validate()?;
    self
      .write(move |conn| queries::update_profile(conn, id, &update))
      .await
  }

  // ── Directory ─────────────────────────────────────────────────────────────

  async fn filter_students(
    &self,
    filter: &DirectoryFilter,
  ) -> Result<Vec<StudentProfile>> {
    let filter = filter.clone();
    self
      .read(move |conn| queries::filter_students(conn, &filter))
      .await
  }

  async fn list_faculties(&self) -> Result<Vec<String>> {
    self.read(queries::list_faculties).await
  }

  async fn list_tags(&self, kind: TagKind) -> Result<Vec<Tag>> {
    self.read(move |conn| queries::list_tags(conn, kind)).await
  }

  async fn ensure_tags(&self, kind: TagKind, names: Vec<String>) -> Result<Vec<Tag>> {
    let names = normalize_names(names);
    self
      .write(move |conn| {
        names
          .iter()
          .map(|name| queries::get_or_create_tag(conn, kind, name))
          .collect()
      })
      .await
  }

  // ── Prompts & matches ─────────────────────────────────────────────────────

  async fn list_prompts(&self) -> Result<Vec<Prompt>> {
    self.read(queries::list_prompts).await
  }

  async fn create_prompt(&self, text: String, created_by: StudentId) -> Result<Prompt> {
    self
      .write(move |conn| queries::create_prompt(conn, &text, created_by))
      .await
  }

  async fn candidates(
    &self,
    student_id: StudentId,
    kind: PromptKind,
  ) -> Result<Vec<StudentProfile>> {
    self
      .read(move |conn| {
        let user = queries::require_profile(conn, student_id)?;
        kind.check_prerequisites(&user)?;
        let everyone =
          queries::into_profiles(conn, queries::all_students(conn)?)?;
        Ok(kind.candidates(&user, everyone)?)
      })
      .await
  }

  async fn create_match(&self, input: NewMatch) -> Result<MatchSummary> {
    self
      .write(move |conn| {
        let submitter = queries::require_profile(conn, input.submitted_by)?;

        let prompt = match input.prompt {
          PromptRef::Builtin(kind) => {
            queries::builtin_prompt(conn, kind, submitter.id)?
          }
          PromptRef::Id(id) => queries::get_prompt(conn, id)?
            .ok_or(CoreError::PromptNotFound(id))?,
        };

        let matched = queries::resolve_student(conn, &input.matched_user)?;
        let candidate = queries::require_profile(conn, matched.id)?;

        if queries::has_answered(conn, prompt.id, submitter.id)? {
          return Err(CoreError::DuplicateSubmission.into());
        }
        prompt.kind.validate(&submitter, &candidate)?;

        queries::insert_match(conn, prompt.id, candidate.id, submitter.id)
      })
      .await
  }

  async fn matches_for(&self, submitter: StudentId) -> Result<Vec<MatchSummary>> {
    self
      .read(move |conn| {
        queries::require_student(conn, submitter)?;
        queries::matches_for(conn, submitter)
      })
      .await
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn send_message(&self, input: NewMessage) -> Result<Message> {
    let input = input.validate()?;
    self
      .write(move |conn| queries::insert_message(conn, &input))
      .await
  }

  async fn fetch_conversation(
    &self,
    user: StudentId,
    other: StudentId,
  ) -> Result<Vec<Message>> {
    self
      .write(move |conn| queries::fetch_conversation(conn, user, other))
      .await
  }

  async fn unread_summary(&self, user: StudentId) -> Result<Vec<UnreadSummary>> {
    self
      .read(move |conn| queries::unread_summary(conn, user))
      .await
  }
}
