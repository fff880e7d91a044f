//! SQL schema for the MBDF SQLite store.
//!
//! Executed unconditionally at every connection startup; the DDL is
//! idempotent. `PRAGMA user_version` is recorded so future migrations can
//! gate on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Stand-in for the portal's identity service. The election engine only
-- reads these two tables; the portal writes them.
CREATE TABLE IF NOT EXISTS room_members (
    room_id  TEXT NOT NULL,
    user_id  TEXT NOT NULL,
    role     TEXT NOT NULL DEFAULT 'member',  -- 'member' | 'lr' | 'admin'
    PRIMARY KEY (room_id, user_id)
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id      TEXT PRIMARY KEY,
    display_name TEXT
);

CREATE TABLE IF NOT EXISTS candidates (
    candidate_id TEXT PRIMARY KEY,
    room_id      TEXT NOT NULL,
    user_id      TEXT NOT NULL,
    is_selected  INTEGER NOT NULL DEFAULT 0,
    nominated_at TEXT NOT NULL,       -- ISO 8601 UTC; earliest row anchors the voting window
    UNIQUE (room_id, user_id)
);

-- One row per (room, voter, candidate); resubmission updates in place.
CREATE TABLE IF NOT EXISTS votes (
    vote_id       TEXT PRIMARY KEY,
    room_id       TEXT NOT NULL,
    voter_id      TEXT NOT NULL,
    candidate_id  TEXT NOT NULL REFERENCES candidates(candidate_id),
    technical     INTEGER NOT NULL,
    experience    INTEGER NOT NULL,
    availability  INTEGER NOT NULL,
    communication INTEGER NOT NULL,
    leadership    INTEGER NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (room_id, voter_id, candidate_id)
);

-- Strictly append-only.
CREATE TABLE IF NOT EXISTS audit_log (
    entry_id    TEXT PRIMARY KEY,
    room_id     TEXT NOT NULL,
    actor_id    TEXT NOT NULL,
    action      TEXT NOT NULL,
    detail      TEXT NOT NULL DEFAULT '{}',  -- JSON context for the action
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS candidates_room_idx ON candidates(room_id);
CREATE INDEX IF NOT EXISTS votes_room_idx      ON votes(room_id);
CREATE INDEX IF NOT EXISTS votes_candidate_idx ON votes(candidate_id);
CREATE INDEX IF NOT EXISTS audit_room_idx      ON audit_log(room_id);

PRAGMA user_version = 1;
";
