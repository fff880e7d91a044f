//! Error type for `mbdf-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown role: {0}")]
  InvalidRole(String),

  #[error("candidate not found: {0}")]
  CandidateNotFound(uuid::Uuid),

  /// The `(room_id, user_id)` uniqueness constraint fired.
  #[error("user {user_id} is already a candidate in room {room_id}")]
  DuplicateCandidate {
    room_id: uuid::Uuid,
    user_id: uuid::Uuid,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
