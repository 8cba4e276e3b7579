//! Error types for `branchout-core`.

use thiserror::Error;

use crate::student::StudentId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  InvalidInput(String),

  #[error("student {0} not found")]
  StudentNotFound(StudentId),

  #[error("student named {0:?} not found")]
  StudentNameNotFound(String),

  #[error("prompt {0} not found")]
  PromptNotFound(i64),

  #[error("{0}")]
  MissingPrerequisite(String),

  #[error("{0}")]
  RuleViolation(String),

  #[error("you have already matched someone to this prompt")]
  DuplicateSubmission,

  #[error("unknown tag kind: {0:?}")]
  UnknownTagKind(String),

  #[error("unknown prompt kind: {0:?}")]
  UnknownPromptKind(String),
}

/// Coarse classification of an [`Error`], used by transport layers to pick a
/// status code without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidInput,
  NotFound,
  MissingPrerequisite,
  RuleViolation,
  DuplicateSubmission,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidInput(_)
      | Error::UnknownTagKind(_)
      | Error::UnknownPromptKind(_) => ErrorKind::InvalidInput,
      Error::StudentNotFound(_)
      | Error::StudentNameNotFound(_)
      | Error::PromptNotFound(_) => ErrorKind::NotFound,
      Error::MissingPrerequisite(_) => ErrorKind::MissingPrerequisite,
      Error::RuleViolation(_) => ErrorKind::RuleViolation,
      Error::DuplicateSubmission => ErrorKind::DuplicateSubmission,
    }
  }

  pub fn invalid(message: impl Into<String>) -> Self {
    Error::InvalidInput(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
