//! Tags: the interests, clubs and languages a student can list.
//!
//! All three are plain named entities with a unique name. They are created
//! lazily the first time a name is referenced and are never deleted.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Which tag vocabulary a [`Tag`] belongs to.
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
)]
pub enum TagKind {
  #[serde(rename = "interests")]
  #[strum(serialize = "interests")]
  Interest,
  #[serde(rename = "clubs")]
  #[strum(serialize = "clubs")]
  Club,
  #[serde(rename = "languages")]
  #[strum(serialize = "languages")]
  Language,
}

impl TagKind {
  /// The vocabulary a fresh installation is seeded with.
  pub fn default_vocabulary(self) -> &'static [&'static str] {
    match self {
      TagKind::Interest => &[
        "Reading",
        "Sports",
        "Music",
        "Art",
        "Gaming",
        "Cooking",
        "Travel",
        "Photography",
        "Coding",
        "Dancing",
      ],
      TagKind::Club => &[
        "Chess Club",
        "Debate Society",
        "Drama Club",
        "Music Society",
        "Sports Club",
        "Coding Club",
        "Photography Club",
        "Art Club",
        "Dance Club",
        "Book Club",
      ],
      TagKind::Language => &[
        "English", "Mandarin", "Spanish", "French", "German", "Japanese",
        "Korean", "Arabic", "Russian", "Hindi",
      ],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub id:   i64,
  pub kind: TagKind,
  pub name: String,
}

/// Trim each name, drop blanks and duplicates, keeping first-seen order.
pub fn normalize_names<I, S>(names: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut out: Vec<String> = Vec::new();
  for name in names {
    let name = name.as_ref().trim();
    if !name.is_empty() && !out.iter().any(|n| n == name) {
      out.push(name.to_owned());
    }
  }
  out
}
