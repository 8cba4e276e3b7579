//! The `DirectoryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `branchout-store-sqlite`).
//! Higher layers (`branchout-api`, `branchout-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  Error,
  message::{Message, NewMessage, UnreadSummary},
  prompt::{MatchSummary, NewMatch, Prompt, PromptKind},
  student::{ExternalIdentity, ProfileUpdate, Student, StudentId, StudentProfile},
  tag::{Tag, TagKind},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend error types expose the domain error behind a failure, if any, so
/// transport layers can classify it without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&Error> { Some(self) }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`DirectoryStore::filter_students`].
///
/// Facets combine conjunctively. Within a tag facet every listed name must be
/// present on the student.
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
  /// Exact faculty match; `None` or blank means any faculty.
  pub faculty:   Option<String>,
  pub interests: Vec<String>,
  pub clubs:     Vec<String>,
  pub languages: Vec<String>,
  /// Exact display-name match.
  pub name:      Option<String>,
}

impl DirectoryFilter {
  pub fn tags(&self, kind: TagKind) -> &[String] {
    match kind {
      TagKind::Interest => &self.interests,
      TagKind::Club => &self.clubs,
      TagKind::Language => &self.languages,
    }
  }

  /// The faculty to filter on, ignoring blank values.
  pub fn faculty(&self) -> Option<&str> {
    self.faculty.as_deref().map(str::trim).filter(|f| !f.is_empty())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a BranchOut storage backend.
///
/// Every write runs in a single transaction: either all of an operation's
/// rows land or none do.
pub trait DirectoryStore: Send + Sync {
  type Error: StoreError;

  // ── Students ──────────────────────────────────────────────────────────

  /// Map a verified external identity to a student, creating one with
  /// default fields on first sight. Idempotent on repeated login.
  fn resolve_identity(
    &self,
    identity: ExternalIdentity,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Retrieve a student row by id. Returns `None` if not found.
  fn get_student(
    &self,
    id: StudentId,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// Retrieve a student with resolved tag names. Returns `None` if not found.
  fn get_profile(
    &self,
    id: StudentId,
  ) -> impl Future<Output = Result<Option<StudentProfile>, Self::Error>> + Send + '_;

  /// First student (by id) with exactly this display name.
  fn find_student_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  /// Apply a profile submission: update the row, replace tag associations
  /// (creating unseen tags), and clear `first_login`.
  fn update_profile(
    &self,
    id: StudentId,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<StudentProfile, Self::Error>> + Send + '_;

  // ── Directory ─────────────────────────────────────────────────────────

  /// Students matching `filter`, ordered by id.
  fn filter_students<'a>(
    &'a self,
    filter: &'a DirectoryFilter,
  ) -> impl Future<Output = Result<Vec<StudentProfile>, Self::Error>> + Send + 'a;

  /// Distinct non-empty faculty values.
  fn list_faculties(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  fn list_tags(
    &self,
    kind: TagKind,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  /// Get-or-create each named tag.
  fn ensure_tags(
    &self,
    kind: TagKind,
    names: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  // ── Prompts & matches ─────────────────────────────────────────────────

  fn list_prompts(
    &self,
  ) -> impl Future<Output = Result<Vec<Prompt>, Self::Error>> + Send + '_;

  /// Create a custom prompt.
  fn create_prompt(
    &self,
    text: String,
    created_by: StudentId,
  ) -> impl Future<Output = Result<Prompt, Self::Error>> + Send + '_;

  /// Other students who could answer a prompt of `kind` for `student_id`.
  fn candidates(
    &self,
    student_id: StudentId,
    kind: PromptKind,
  ) -> impl Future<Output = Result<Vec<StudentProfile>, Self::Error>> + Send + '_;

  /// Validate and record a match.
  ///
  /// Fails with `DuplicateSubmission` if the submitter already answered the
  /// prompt, or `RuleViolation` if the candidate does not satisfy it.
  fn create_match(
    &self,
    input: NewMatch,
  ) -> impl Future<Output = Result<MatchSummary, Self::Error>> + Send + '_;

  /// Matches submitted by `submitter`, oldest first.
  fn matches_for(
    &self,
    submitter: StudentId,
  ) -> impl Future<Output = Result<Vec<MatchSummary>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Record a new unread message. The timestamp is set by the store.
  fn send_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// All messages between `user` and `other`, oldest first. Messages
  /// addressed to `user` are marked read as part of the same operation.
  fn fetch_conversation(
    &self,
    user: StudentId,
    other: StudentId,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Unread messages addressed to `user`, counted per sender.
  fn unread_summary(
    &self,
    user: StudentId,
  ) -> impl Future<Output = Result<Vec<UnreadSummary>, Self::Error>> + Send + '_;
}
