//! SQLite schema definitions and SQL query constants.
//!
//! All SQL used by the SQLite repository lives here as pure data, no I/O.
//!
//! Every entity kind shares one `records` table. A record's identity is its
//! composite primary key (kind, season, subject_id, secondary_key); the
//! payload column holds the serialized record. Kinds without a secondary
//! dimension store the empty string in `secondary_key`, since NULL columns
//! cannot participate in a primary key.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Synced records, one row per natural key per kind
CREATE TABLE IF NOT EXISTS records (
    kind TEXT NOT NULL,
    season TEXT NOT NULL,
    subject_id INTEGER NOT NULL,
    secondary_key TEXT NOT NULL DEFAULT '',
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (kind, season, subject_id, secondary_key)
);

-- Tracked subjects, the population a sync run fans out over
CREATE TABLE IF NOT EXISTS subjects (
    season TEXT NOT NULL,
    subject_id INTEGER NOT NULL,
    label TEXT,
    created_at TEXT NOT NULL,
    PRIMARY KEY (season, subject_id)
);

-- Indexes for efficient queries
CREATE INDEX IF NOT EXISTS idx_records_subject ON records(kind, season, subject_id);
"#;

// Record queries

/// Insert that silently keeps the existing row on a natural-key conflict.
pub const INSERT_RECORD_SKIP_IF_EXISTS: &str = r#"
INSERT INTO records (kind, season, subject_id, secondary_key, payload, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
ON CONFLICT (kind, season, subject_id, secondary_key) DO NOTHING
"#;

/// Insert that replaces the existing payload on a natural-key conflict.
pub const INSERT_RECORD_OVERWRITE: &str = r#"
INSERT INTO records (kind, season, subject_id, secondary_key, payload, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
ON CONFLICT (kind, season, subject_id, secondary_key) DO UPDATE SET
    payload = excluded.payload,
    updated_at = excluded.updated_at
"#;

pub const SELECT_RECORD_BY_KEY: &str = r#"
SELECT payload
FROM records
WHERE kind = ?1 AND season = ?2 AND subject_id = ?3 AND secondary_key = ?4
"#;

pub const SELECT_RECORDS_BY_KIND: &str = r#"
SELECT payload
FROM records
WHERE kind = ?1 AND season = ?2
ORDER BY subject_id, secondary_key
"#;

pub const SELECT_RECORDS_BY_SUBJECT: &str = r#"
SELECT payload
FROM records
WHERE kind = ?1 AND season = ?2 AND subject_id = ?3
ORDER BY secondary_key
"#;

pub const DELETE_RECORDS_BY_KIND: &str = r#"
DELETE FROM records
WHERE kind = ?1 AND season = ?2
"#;

pub const DELETE_RECORDS_BY_SUBJECT: &str = r#"
DELETE FROM records
WHERE kind = ?1 AND season = ?2 AND subject_id = ?3
"#;

// Subject queries

pub const INSERT_SUBJECT: &str = r#"
INSERT INTO subjects (season, subject_id, label, created_at)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (season, subject_id) DO UPDATE SET
    label = excluded.label
"#;

pub const SELECT_SUBJECTS: &str = r#"
SELECT subject_id
FROM subjects
WHERE season = ?1
ORDER BY subject_id
"#;

pub const DELETE_SUBJECT: &str = r#"
DELETE FROM subjects
WHERE season = ?1 AND subject_id = ?2
"#;
