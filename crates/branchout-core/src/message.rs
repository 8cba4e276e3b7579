//! Direct messages between two students.
//!
//! Messages are append-only. The `read` flag is the only field that ever
//! changes, and only as a side effect of the receiver fetching the
//! conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, student::StudentId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:          i64,
  pub sender_id:   StudentId,
  pub receiver_id: StudentId,
  pub content:     String,
  /// Server-assigned; never changes after creation.
  pub timestamp:   DateTime<Utc>,
  pub read:        bool,
}

/// Input to [`crate::store::DirectoryStore::send_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub sender_id:   StudentId,
  pub receiver_id: StudentId,
  pub content:     String,
}

impl NewMessage {
  pub fn validate(self) -> Result<Self> {
    if self.content.trim().is_empty() {
      return Err(Error::invalid("message content must not be empty"));
    }
    Ok(self)
  }
}

/// Unread messages addressed to one student from a single sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadSummary {
  pub sender_id:   StudentId,
  pub sender_name: String,
  pub count:       u32,
}
