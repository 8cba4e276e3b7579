//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so they sort lexically.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use branchout_core::{
  prompt::{Prompt, PromptKind},
  tag::TagKind,
};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PromptKind
// ───────────────────────────────────────────────────────────────

pub fn encode_prompt_kind(k: PromptKind) -> &'static str { k.into() }

pub fn decode_prompt_kind(s: &str) -> Result<PromptKind> {
  s.parse()
    .map_err(|_| branchout_core::Error::UnknownPromptKind(s.to_owned()).into())
}

// ─── TagKind ─────────────────────────────────────────────────────────────────

/// Table names backing one tag vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct TagTables {
  /// The vocabulary table (`id`, `name`).
  pub table: &'static str,
  /// The student join table.
  pub join:  &'static str,
  /// The join table's foreign key into `table`.
  pub fk:    &'static str,
}

pub fn tag_tables(kind: TagKind) -> TagTables {
  match kind {
    TagKind::Interest => TagTables {
      table: "interests",
      join:  "student_interests",
      fk:    "interest_id",
    },
    TagKind::Club => TagTables {
      table: "clubs",
      join:  "student_clubs",
      fk:    "club_id",
    },
    TagKind::Language => TagTables {
      table: "languages",
      join:  "student_languages",
      fk:    "language_id",
    },
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `prompts` row.
pub struct RawPrompt {
  pub id:         i64,
  pub text:       String,
  pub kind:       String,
  pub created_by: i64,
  pub created_at: String,
}

impl RawPrompt {
  pub const COLUMNS: &'static str = "id, text, kind, created_by, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawPrompt {
      id:         row.get(0)?,
      text:       row.get(1)?,
      kind:       row.get(2)?,
      created_by: row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_prompt(self) -> Result<Prompt> {
    Ok(Prompt {
      id:         self.id,
      text:       self.text,
      kind:       decode_prompt_kind(&self.kind)?,
      created_by: self.created_by,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
