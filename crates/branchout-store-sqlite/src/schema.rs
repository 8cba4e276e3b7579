//! SQL schema for the BranchOut SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS students (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL,
    year            INTEGER NOT NULL,
    faculty         TEXT    NOT NULL,
    profile_picture TEXT    NOT NULL,
    oauth_subject   TEXT    UNIQUE,
    email           TEXT    UNIQUE,
    first_login     INTEGER NOT NULL DEFAULT 1
);

-- Tag vocabularies. Rows are created on first reference and never deleted.
CREATE TABLE IF NOT EXISTS interests (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS clubs (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS languages (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS student_interests (
    student_id  INTEGER NOT NULL REFERENCES students(id),
    interest_id INTEGER NOT NULL REFERENCES interests(id),
    PRIMARY KEY (student_id, interest_id)
);

CREATE TABLE IF NOT EXISTS student_clubs (
    student_id INTEGER NOT NULL REFERENCES students(id),
    club_id    INTEGER NOT NULL REFERENCES clubs(id),
    PRIMARY KEY (student_id, club_id)
);

CREATE TABLE IF NOT EXISTS student_languages (
    student_id  INTEGER NOT NULL REFERENCES students(id),
    language_id INTEGER NOT NULL REFERENCES languages(id),
    PRIMARY KEY (student_id, language_id)
);

CREATE TABLE IF NOT EXISTS prompts (
    id         INTEGER PRIMARY KEY,
    text       TEXT    NOT NULL,
    kind       TEXT    NOT NULL DEFAULT 'custom',
    created_by INTEGER NOT NULL REFERENCES students(id),
    created_at TEXT    NOT NULL   -- RFC 3339 UTC; server-assigned
);

-- Built-in prompts are looked up by their reserved text; at most one row each.
CREATE UNIQUE INDEX IF NOT EXISTS prompts_builtin_text_idx
    ON prompts(text) WHERE kind != 'custom';

-- Strictly append-only.
CREATE TABLE IF NOT EXISTS matches (
    id              INTEGER PRIMARY KEY,
    prompt_id       INTEGER NOT NULL REFERENCES prompts(id),
    matched_user_id INTEGER NOT NULL REFERENCES students(id),
    submitted_by    INTEGER NOT NULL REFERENCES students(id),
    timestamp       TEXT    NOT NULL,
    UNIQUE (prompt_id, submitted_by)
);

-- Append-only; `is_read` is the only column ever updated.
CREATE TABLE IF NOT EXISTS messages (
    id          INTEGER PRIMARY KEY,
    sender_id   INTEGER NOT NULL REFERENCES students(id),
    receiver_id INTEGER NOT NULL REFERENCES students(id),
    content     TEXT    NOT NULL,
    timestamp   TEXT    NOT NULL,
    is_read     INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS messages_pair_idx   ON messages(sender_id, receiver_id);
CREATE INDEX IF NOT EXISTS messages_unread_idx ON messages(receiver_id, is_read);
CREATE INDEX IF NOT EXISTS matches_submitter_idx ON matches(submitted_by);

PRAGMA user_version = 1;
";
