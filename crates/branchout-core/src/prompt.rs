//! Prompts and the matches students submit in answer to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{
  AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr,
};

use crate::student::{StudentId, StudentRef};

// ─── Prompt kind ─────────────────────────────────────────────────────────────

/// The rule set a prompt is judged by.
///
/// Three kinds are built in and identified by reserved prompt text. Anything
/// else is `Custom`, which imposes no constraint on who may be matched.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PromptKind {
  SameFaculty,
  SameLanguageAndHobby,
  DifferentYearSameClub,
  Custom,
}

impl PromptKind {
  /// Parse a client-supplied prompt type. Unrecognised tags fall back to
  /// [`PromptKind::Custom`].
  pub fn from_tag(tag: &str) -> Self { tag.parse().unwrap_or(Self::Custom) }

  /// The reserved text of a built-in prompt; `None` for `Custom`.
  pub fn builtin_text(self) -> Option<&'static str> {
    match self {
      Self::SameFaculty => Some("Find someone in the same faculty as you"),
      Self::SameLanguageAndHobby => {
        Some("Find someone who speaks the same language and shares a hobby")
      }
      Self::DifferentYearSameClub => {
        Some("Find someone in a different year but in the same club")
      }
      Self::Custom => None,
    }
  }

  pub fn is_builtin(self) -> bool { self.builtin_text().is_some() }

  pub fn builtins() -> impl Iterator<Item = Self> {
    Self::iter().filter(|k| k.is_builtin())
  }
}

// ─── Prompt ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
  pub id:         i64,
  pub text:       String,
  pub kind:       PromptKind,
  pub created_by: StudentId,
  pub created_at: DateTime<Utc>,
}

/// Which prompt a match answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRef {
  /// A built-in prompt, created on first use.
  Builtin(PromptKind),
  /// A stored prompt by id.
  Id(i64),
}

// ─── Match ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::DirectoryStore::create_match`].
#[derive(Debug, Clone)]
pub struct NewMatch {
  pub prompt:       PromptRef,
  pub matched_user: StudentRef,
  pub submitted_by: StudentId,
}

/// A recorded match, joined with the prompt text and the matched student's
/// display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
  pub id:                           i64,
  pub prompt_id:                    i64,
  pub prompt_text:                  String,
  pub matched_user_id:              StudentId,
  pub matched_user_name:            String,
  pub matched_user_profile_picture: String,
  pub submitted_by:                 StudentId,
  pub timestamp:                    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_tag_is_custom() {
    assert_eq!(PromptKind::from_tag("same_faculty"), PromptKind::SameFaculty);
    assert_eq!(PromptKind::from_tag("most_helpful"), PromptKind::Custom);
    assert_eq!(PromptKind::from_tag(""), PromptKind::Custom);
  }

  #[test]
  fn three_builtins_with_distinct_text() {
    let texts: Vec<_> =
      PromptKind::builtins().filter_map(PromptKind::builtin_text).collect();
    assert_eq!(texts.len(), 3);
    assert!(texts.iter().all(|t| texts.iter().filter(|o| *o == t).count() == 1));
  }
}
