//! Synchronous query helpers.
//!
//! Every function takes a plain `&Connection` so it can run either directly
//! or inside a [`rusqlite::Transaction`] (which derefs to one). The async
//! wrappers in [`crate::store`] decide the transaction boundaries.

use std::collections::HashMap;

use branchout_core::{
  Error as CoreError,
  message::{Message, NewMessage, UnreadSummary},
  prompt::{MatchSummary, Prompt, PromptKind},
  store::DirectoryFilter,
  student::{
    DEFAULT_PROFILE_PICTURE, DEFAULT_STUDENT_NAME, ExternalIdentity,
    ProfileUpdate, Student, StudentId, StudentProfile, StudentRef,
  },
  tag::{Tag, TagKind, normalize_names},
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use strum::IntoEnumIterator as _;

use crate::{
  Result,
  encode::{RawPrompt, decode_dt, encode_dt, encode_prompt_kind, now, tag_tables},
};

// ─── Students ────────────────────────────────────────────────────────────────

const STUDENT_COLUMNS: &str =
  "id, name, year, faculty, profile_picture, oauth_subject, email, first_login";

fn student_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
  Ok(Student {
    id:              row.get(0)?,
    name:            row.get(1)?,
    year:            row.get(2)?,
    faculty:         row.get(3)?,
    profile_picture: row.get(4)?,
    oauth_subject:   row.get(5)?,
    email:           row.get(6)?,
    first_login:     row.get(7)?,
  })
}

fn student_where(
  conn: &Connection,
  clause: &str,
  value: &dyn rusqlite::ToSql,
) -> Result<Option<Student>> {
  let sql =
    format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {clause} ORDER BY id LIMIT 1");
  Ok(conn.query_row(&sql, [value], student_from_row).optional()?)
}

pub fn get_student(conn: &Connection, id: StudentId) -> Result<Option<Student>> {
  student_where(conn, "id = ?1", &id)
}

pub fn require_student(conn: &Connection, id: StudentId) -> Result<Student> {
  get_student(conn, id)?.ok_or_else(|| CoreError::StudentNotFound(id).into())
}

pub fn find_student_by_name(conn: &Connection, name: &str) -> Result<Option<Student>> {
  student_where(conn, "name = ?1", &name)
}

pub fn resolve_student(conn: &Connection, r: &StudentRef) -> Result<Student> {
  match r {
    StudentRef::Id(id) => require_student(conn, *id),
    StudentRef::Name(name) => find_student_by_name(conn, name)?
      .ok_or_else(|| CoreError::StudentNameNotFound(name.clone()).into()),
  }
}

/// Look up a student by identity subject, then by email; insert one with
/// default fields if neither matches.
pub fn resolve_identity(conn: &Connection, identity: &ExternalIdentity) -> Result<Student> {
  if let Some(student) = student_where(conn, "oauth_subject = ?1", &identity.subject)? {
    return Ok(student);
  }
  if let Some(email) = &identity.email
    && let Some(student) = student_where(conn, "email = ?1", email)?
  {
    return Ok(student);
  }

  let name = identity
    .name
    .as_deref()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .unwrap_or(DEFAULT_STUDENT_NAME);
  let picture = identity.picture.as_deref().unwrap_or(DEFAULT_PROFILE_PICTURE);

  conn.execute(
    "INSERT OR IGNORE INTO students
       (name, year, faculty, profile_picture, oauth_subject, email, first_login)
     VALUES (?1, 1, '', ?2, ?3, ?4, 1)",
    params![name, picture, identity.subject, identity.email],
  )?;

  student_where(conn, "oauth_subject = ?1", &identity.subject)?.ok_or_else(|| {
    CoreError::invalid(format!(
      "identity {:?} conflicts with an existing student",
      identity.subject
    ))
    .into()
  })
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// Tag names per student for one vocabulary. `only` restricts the lookup to
/// a single student.
fn tag_names(
  conn: &Connection,
  kind: TagKind,
  only: Option<StudentId>,
) -> Result<HashMap<StudentId, Vec<String>>> {
  let t = tag_tables(kind);
  let filter = if only.is_some() { "WHERE j.student_id = ?1" } else { "" };
  let sql = format!(
    "SELECT j.student_id, t.name
     FROM {join} j
     JOIN {table} t ON t.id = j.{fk}
     {filter}
     ORDER BY t.id",
    join = t.join,
    table = t.table,
    fk = t.fk,
  );

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params_from_iter(only), |row| {
      Ok((row.get::<_, StudentId>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut out: HashMap<StudentId, Vec<String>> = HashMap::new();
  for (student_id, name) in rows {
    out.entry(student_id).or_default().push(name);
  }
  Ok(out)
}

/// Attach resolved tag names to each student, preserving order.
pub fn into_profiles(conn: &Connection, students: Vec<Student>) -> Result<Vec<StudentProfile>> {
  let only = match students.as_slice() {
    [single] => Some(single.id),
    _ => None,
  };

  let mut profiles: Vec<StudentProfile> =
    students.iter().map(StudentProfile::bare).collect();

  for kind in TagKind::iter() {
    let mut names = tag_names(conn, kind, only)?;
    for profile in &mut profiles {
      if let Some(list) = names.remove(&profile.id) {
        *profile.tags_mut(kind) = list;
      }
    }
  }
  Ok(profiles)
}

pub fn get_profile(conn: &Connection, id: StudentId) -> Result<Option<StudentProfile>> {
  match get_student(conn, id)? {
    Some(student) => Ok(into_profiles(conn, vec![student])?.pop()),
    None => Ok(None),
  }
}

pub fn require_profile(conn: &Connection, id: StudentId) -> Result<StudentProfile> {
  get_profile(conn, id)?.ok_or_else(|| CoreError::StudentNotFound(id).into())
}

pub fn update_profile(
  conn: &Connection,
  id: StudentId,
  update: &ProfileUpdate,
) -> Result<StudentProfile> {
  require_student(conn, id)?;

  conn.execute(
    "UPDATE students
     SET name = ?2, year = ?3, faculty = ?4,
         profile_picture = COALESCE(?5, profile_picture),
         first_login = 0
     WHERE id = ?1",
    params![id, update.name, update.year, update.faculty, update.profile_picture],
  )?;

  for kind in TagKind::iter() {
    let t = tag_tables(kind);
    conn.execute(
      &format!("DELETE FROM {} WHERE student_id = ?1", t.join),
      params![id],
    )?;
    for name in update.tags(kind) {
      let tag = get_or_create_tag(conn, kind, name)?;
      conn.execute(
        &format!(
          "INSERT OR IGNORE INTO {} (student_id, {}) VALUES (?1, ?2)",
          t.join, t.fk
        ),
        params![id, tag.id],
      )?;
    }
  }

  require_profile(conn, id)
}

// ─── Directory ───────────────────────────────────────────────────────────────

pub fn all_students(conn: &Connection) -> Result<Vec<Student>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"))?;
  let rows = stmt
    .query_map([], student_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub fn filter_students(conn: &Connection, filter: &DirectoryFilter) -> Result<Vec<StudentProfile>> {
  let mut conds: Vec<String> = vec![];
  let mut values: Vec<String> = vec![];

  if let Some(faculty) = filter.faculty() {
    values.push(faculty.to_owned());
    conds.push(format!("s.faculty = ?{}", values.len()));
  }
  if let Some(name) = &filter.name {
    values.push(name.clone());
    conds.push(format!("s.name = ?{}", values.len()));
  }
  for kind in TagKind::iter() {
    let t = tag_tables(kind);
    for name in normalize_names(filter.tags(kind)) {
      values.push(name);
      conds.push(format!(
        "EXISTS (SELECT 1 FROM {join} j JOIN {table} t ON t.id = j.{fk}
                 WHERE j.student_id = s.id AND t.name = ?{n})",
        join = t.join,
        table = t.table,
        fk = t.fk,
        n = values.len(),
      ));
    }
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };

  let columns = STUDENT_COLUMNS
    .split(", ")
    .map(|c| format!("s.{c}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!("SELECT {columns} FROM students s {where_clause} ORDER BY s.id");

  let mut stmt = conn.prepare(&sql)?;
  let students = stmt
    .query_map(params_from_iter(values.iter()), student_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  into_profiles(conn, students)
}

pub fn list_faculties(conn: &Connection) -> Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT DISTINCT faculty FROM students WHERE faculty != '' ORDER BY faculty",
  )?;
  let rows = stmt
    .query_map([], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn list_tags(conn: &Connection, kind: TagKind) -> Result<Vec<Tag>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT id, name FROM {} ORDER BY id",
    tag_tables(kind).table
  ))?;
  let rows = stmt
    .query_map([], |row| {
      Ok(Tag { id: row.get(0)?, kind, name: row.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Insert-or-fetch on the unique `name` column; never produces a duplicate
/// row regardless of how many callers race on the same name.
pub fn get_or_create_tag(conn: &Connection, kind: TagKind, name: &str) -> Result<Tag> {
  let table = tag_tables(kind).table;
  conn.execute(
    &format!("INSERT INTO {table} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING"),
    params![name],
  )?;
  let id: i64 = conn.query_row(
    &format!("SELECT id FROM {table} WHERE name = ?1"),
    params![name],
    |row| row.get(0),
  )?;
  Ok(Tag { id, kind, name: name.to_owned() })
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

pub fn list_prompts(conn: &Connection) -> Result<Vec<Prompt>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM prompts ORDER BY id",
    RawPrompt::COLUMNS
  ))?;
  let raws = stmt
    .query_map([], RawPrompt::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPrompt::into_prompt).collect()
}

pub fn get_prompt(conn: &Connection, id: i64) -> Result<Option<Prompt>> {
  let raw = conn
    .query_row(
      &format!("SELECT {} FROM prompts WHERE id = ?1", RawPrompt::COLUMNS),
      params![id],
      RawPrompt::from_row,
    )
    .optional()?;
  raw.map(RawPrompt::into_prompt).transpose()
}

pub fn create_prompt(conn: &Connection, text: &str, created_by: StudentId) -> Result<Prompt> {
  let text = text.trim();
  if text.is_empty() {
    return Err(CoreError::invalid("prompt text is required").into());
  }
  require_student(conn, created_by)?;

  let created_at = now();
  conn.execute(
    "INSERT INTO prompts (text, kind, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
    params![
      text,
      encode_prompt_kind(PromptKind::Custom),
      created_by,
      encode_dt(created_at)
    ],
  )?;

  Ok(Prompt {
    id: conn.last_insert_rowid(),
    text: text.to_owned(),
    kind: PromptKind::Custom,
    created_by,
    created_at,
  })
}

/// Get-or-create the row for a built-in prompt. The partial unique index on
/// built-in prompt text turns a concurrent second insert into a no-op.
pub fn builtin_prompt(conn: &Connection, kind: PromptKind, created_by: StudentId) -> Result<Prompt> {
  let Some(text) = kind.builtin_text() else {
    return Err(
      CoreError::invalid(format!("{kind} is not a built-in prompt type")).into(),
    );
  };
  let kind_str = encode_prompt_kind(kind);

  conn.execute(
    "INSERT OR IGNORE INTO prompts (text, kind, created_by, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    params![text, kind_str, created_by, encode_dt(now())],
  )?;

  let raw = conn.query_row(
    &format!(
      "SELECT {} FROM prompts WHERE text = ?1 AND kind = ?2",
      RawPrompt::COLUMNS
    ),
    params![text, kind_str],
    RawPrompt::from_row,
  )?;
  raw.into_prompt()
}

// ─── Matches ─────────────────────────────────────────────────────────────────

fn match_summaries(
  conn: &Connection,
  clause: &str,
  value: i64,
) -> Result<Vec<MatchSummary>> {
  let sql = format!(
    "SELECT m.id, m.prompt_id, p.text, m.matched_user_id, s.name,
            s.profile_picture, m.submitted_by, m.timestamp
     FROM matches m
     JOIN prompts  p ON p.id = m.prompt_id
     JOIN students s ON s.id = m.matched_user_id
     WHERE {clause}
     ORDER BY m.id"
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params![value], |row| {
      Ok((
        row.get::<_, i64>(0)?,
        row.get::<_, i64>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, i64>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, String>(5)?,
        row.get::<_, i64>(6)?,
        row.get::<_, String>(7)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(id, prompt_id, prompt_text, matched_user_id, name, picture, submitted_by, ts)| {
      Ok(MatchSummary {
        id,
        prompt_id,
        prompt_text,
        matched_user_id,
        matched_user_name: name,
        matched_user_profile_picture: picture,
        submitted_by,
        timestamp: decode_dt(&ts)?,
      })
    })
    .collect()
}

pub fn matches_for(conn: &Connection, submitter: StudentId) -> Result<Vec<MatchSummary>> {
  match_summaries(conn, "m.submitted_by = ?1", submitter)
}

pub fn has_answered(conn: &Connection, prompt_id: i64, submitter: StudentId) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM matches WHERE prompt_id = ?1 AND submitted_by = ?2",
        params![prompt_id, submitter],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Insert a match row. A UNIQUE violation on (prompt, submitter) surfaces
/// as [`CoreError::DuplicateSubmission`].
pub fn insert_match(
  conn: &Connection,
  prompt_id: i64,
  matched_user_id: StudentId,
  submitted_by: StudentId,
) -> Result<MatchSummary> {
  let inserted = conn.execute(
    "INSERT INTO matches (prompt_id, matched_user_id, submitted_by, timestamp)
     VALUES (?1, ?2, ?3, ?4)",
    params![prompt_id, matched_user_id, submitted_by, encode_dt(now())],
  );
  match inserted {
    Ok(_) => {}
    Err(rusqlite::Error::SqliteFailure(e, _))
      if e.code == rusqlite::ErrorCode::ConstraintViolation
        && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      return Err(CoreError::DuplicateSubmission.into());
    }
    Err(e) => return Err(e.into()),
  }

  let id = conn.last_insert_rowid();
  match_summaries(conn, "m.id = ?1", id)?
    .pop()
    .ok_or_else(|| CoreError::PromptNotFound(prompt_id).into())
}

// ─── Messages ────────────────────────────────────────────────────────────────

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, timestamp, is_read";

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Message>> {
  let timestamp: String = row.get(4)?;
  let (id, sender_id, receiver_id, content, read) =
    (row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(5)?);
  Ok(decode_dt(&timestamp).map(|timestamp| Message {
    id,
    sender_id,
    receiver_id,
    content,
    timestamp,
    read,
  }))
}

pub fn insert_message(conn: &Connection, input: &NewMessage) -> Result<Message> {
  require_student(conn, input.sender_id)?;
  require_student(conn, input.receiver_id)?;

  let timestamp = now();
  conn.execute(
    "INSERT INTO messages (sender_id, receiver_id, content, timestamp, is_read)
     VALUES (?1, ?2, ?3, ?4, 0)",
    params![
      input.sender_id,
      input.receiver_id,
      input.content,
      encode_dt(timestamp)
    ],
  )?;

  Ok(Message {
    id: conn.last_insert_rowid(),
    sender_id: input.sender_id,
    receiver_id: input.receiver_id,
    content: input.content.clone(),
    timestamp,
    read: false,
  })
}

/// Mark everything `other` sent to `user` as read, then return the whole
/// conversation oldest first.
pub fn fetch_conversation(
  conn: &Connection,
  user: StudentId,
  other: StudentId,
) -> Result<Vec<Message>> {
  require_student(conn, user)?;
  require_student(conn, other)?;

  conn.execute(
    "UPDATE messages SET is_read = 1
     WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
    params![user, other],
  )?;

  let mut stmt = conn.prepare(&format!(
    "SELECT {MESSAGE_COLUMNS}
     FROM messages
     WHERE (sender_id = ?1 AND receiver_id = ?2)
        OR (sender_id = ?2 AND receiver_id = ?1)
     ORDER BY timestamp, id"
  ))?;
  let rows = stmt
    .query_map(params![user, other], message_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows.into_iter().collect()
}

pub fn unread_summary(conn: &Connection, user: StudentId) -> Result<Vec<UnreadSummary>> {
  require_student(conn, user)?;

  let mut stmt = conn.prepare(
    "SELECT m.sender_id, s.name, COUNT(*)
     FROM messages m
     JOIN students s ON s.id = m.sender_id
     WHERE m.receiver_id = ?1 AND m.is_read = 0
     GROUP BY m.sender_id, s.name
     ORDER BY MIN(m.id)",
  )?;
  let rows = stmt
    .query_map(params![user], |row| {
      Ok(UnreadSummary {
        sender_id:   row.get(0)?,
        sender_name: row.get(1)?,
        count:       row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
