//! Students, their profiles, and the external identity that logs them in.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  tag::{TagKind, normalize_names},
};

pub type StudentId = i64;

/// Picture URI used until a student uploads their own.
pub const DEFAULT_PROFILE_PICTURE: &str = "/static/img/default-profile.jpg";

/// Name given to a student whose identity provider supplied none.
pub const DEFAULT_STUDENT_NAME: &str = "New Student";

// ─── Student ─────────────────────────────────────────────────────────────────

/// The stored student row, including the identity fields used at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub id:              StudentId,
  pub name:            String,
  pub year:            i64,
  pub faculty:         String,
  pub profile_picture: String,
  pub oauth_subject:   Option<String>,
  pub email:           Option<String>,
  /// Set on creation; cleared by the first profile submission.
  pub first_login:     bool,
}

/// The directory view of a student: the row plus resolved tag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
  pub id:              StudentId,
  pub name:            String,
  pub year:            i64,
  pub faculty:         String,
  pub profile_picture: String,
  pub interests:       Vec<String>,
  pub clubs:           Vec<String>,
  pub languages:       Vec<String>,
}

impl StudentProfile {
  pub fn tags(&self, kind: TagKind) -> &[String] {
    match kind {
      TagKind::Interest => &self.interests,
      TagKind::Club => &self.clubs,
      TagKind::Language => &self.languages,
    }
  }

  pub fn tags_mut(&mut self, kind: TagKind) -> &mut Vec<String> {
    match kind {
      TagKind::Interest => &mut self.interests,
      TagKind::Club => &mut self.clubs,
      TagKind::Language => &mut self.languages,
    }
  }

  /// A profile with no tags yet.
  pub fn bare(student: &Student) -> Self {
    Self {
      id:              student.id,
      name:            student.name.clone(),
      year:            student.year,
      faculty:         student.faculty.clone(),
      profile_picture: student.profile_picture.clone(),
      interests:       Vec::new(),
      clubs:           Vec::new(),
      languages:       Vec::new(),
    }
  }
}

/// Refers to a student either by id or by exact display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentRef {
  Id(StudentId),
  Name(String),
}

// ─── Profile submission ──────────────────────────────────────────────────────

/// Input to [`crate::store::DirectoryStore::update_profile`].
///
/// Tag lists replace the student's current associations. A `None` picture
/// keeps the existing one.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub name:            String,
  pub year:            i64,
  pub faculty:         String,
  pub profile_picture: Option<String>,
  pub interests:       Vec<String>,
  pub clubs:           Vec<String>,
  pub languages:       Vec<String>,
}

impl ProfileUpdate {
  /// Check required fields and normalise tag names in place.
  pub fn validate(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    self.faculty = self.faculty.trim().to_owned();

    if self.name.is_empty() {
      return Err(Error::invalid("name is required"));
    }
    if self.faculty.is_empty() {
      return Err(Error::invalid("faculty is required"));
    }
    if self.year < 1 {
      return Err(Error::invalid(format!(
        "year must be a positive integer, got {}",
        self.year
      )));
    }

    self.interests = normalize_names(&self.interests);
    self.clubs = normalize_names(&self.clubs);
    self.languages = normalize_names(&self.languages);
    Ok(self)
  }

  pub fn tags(&self, kind: TagKind) -> &[String] {
    match kind {
      TagKind::Interest => &self.interests,
      TagKind::Club => &self.clubs,
      TagKind::Language => &self.languages,
    }
  }

  pub fn tags_mut(&mut self, kind: TagKind) -> &mut Vec<String> {
    match kind {
      TagKind::Interest => &mut self.interests,
      TagKind::Club => &mut self.clubs,
      TagKind::Language => &mut self.languages,
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// A verified identity handed over by a login provider.
///
/// `subject` is the provider's stable id for the user (the OAuth `sub`
/// claim, or the address itself for email login).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
  pub subject: String,
  pub email:   Option<String>,
  pub name:    Option<String>,
  pub picture: Option<String>,
}

impl ExternalIdentity {
  pub fn from_email(email: impl Into<String>, name: Option<String>) -> Self {
    let email = email.into();
    Self {
      subject: email.clone(),
      email: Some(email),
      name,
      picture: None,
    }
  }

  pub fn validate(self) -> Result<Self> {
    if self.subject.trim().is_empty() {
      return Err(Error::invalid("identity subject is required"));
    }
    Ok(self)
  }
}
