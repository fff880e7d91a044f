//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, roles as lowercase keywords, and audit detail as
//! compact JSON.

use chrono::{DateTime, Utc};
use mbdf_core::{
  candidate::Candidate,
  policy::Role,
  vote::{Scores, Vote},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Member => "member",
    Role::Lr => "lr",
    Role::Admin => "admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "member" => Ok(Role::Member),
    "lr" => Ok(Role::Lr),
    "admin" => Ok(Role::Admin),
    other => Err(Error::InvalidRole(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `candidates` row.
pub struct RawCandidate {
  pub candidate_id: String,
  pub room_id:      String,
  pub user_id:      String,
  pub is_selected:  bool,
  pub nominated_at: String,
}

impl RawCandidate {
  pub fn into_candidate(self) -> Result<Candidate> {
    Ok(Candidate {
      candidate_id: decode_uuid(&self.candidate_id)?,
      room_id:      decode_uuid(&self.room_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      is_selected:  self.is_selected,
      nominated_at: decode_dt(&self.nominated_at)?,
    })
  }
}

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:       String,
  pub room_id:       String,
  pub voter_id:      String,
  pub candidate_id:  String,
  pub technical:     u8,
  pub experience:    u8,
  pub availability:  u8,
  pub communication: u8,
  pub leadership:    u8,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawVote {
  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:      decode_uuid(&self.vote_id)?,
      room_id:      decode_uuid(&self.room_id)?,
      voter_id:     decode_uuid(&self.voter_id)?,
      candidate_id: decode_uuid(&self.candidate_id)?,
      scores:       Scores {
        technical:     self.technical,
        experience:    self.experience,
        availability:  self.availability,
        communication: self.communication,
        leadership:    self.leadership,
      },
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
