//! Consumed external interfaces: the durable election store, the room
//! directory, and the audit sink.
//!
//! The engine depends on these traits only; `mbdf-store-sqlite` implements
//! all three on one type. All methods return `Send` futures so the traits
//! can be used in multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  candidate::{Candidate, NewCandidate},
  policy::Role,
  vote::{NewVote, Vote},
};

// ─── ElectionStore ───────────────────────────────────────────────────────────

/// Durable storage for candidates and votes.
pub trait ElectionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Candidates ────────────────────────────────────────────────────────

  /// Insert a nomination, assigning id and timestamp.
  fn add_candidate(
    &self,
    input: NewCandidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  fn candidate(
    &self,
    candidate_id: Uuid,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// A user's candidacy in a room, if any.
  fn candidate_for_user(
    &self,
    room_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// All candidates in a room, earliest nomination first.
  fn list_candidates(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  /// Atomically clear every selection in the room and select
  /// `candidate_id`. Either both writes land or neither does.
  fn mark_selected(
    &self,
    room_id: Uuid,
    candidate_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Clear the room's selection, if any. Returns whether a flag was
  /// actually cleared.
  fn clear_selected(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a candidate together with every vote referencing them,
  /// returning the number of votes removed.
  fn remove_candidate(
    &self,
    candidate_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Insert the (room, voter, candidate) vote, or overwrite its scores if
  /// it already exists. The stored id and creation time survive overwrites.
  fn upsert_vote(
    &self,
    input: NewVote,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  fn votes_for_room(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  /// How many votes a candidate has received.
  fn vote_count_for_candidate(
    &self,
    candidate_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Delete every vote in the room, returning how many were removed.
  /// Candidates are untouched.
  fn delete_room_votes(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── RoomDirectory ───────────────────────────────────────────────────────────

/// Membership and identity, owned by the surrounding portal.
pub trait RoomDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The user's role in the room, or `None` for non-members.
  fn membership(
    &self,
    room_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + '_;

  fn member_count(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Set an existing member's role. Promoting a user who is not in the
  /// member table is a no-op; the portal adds members through its own flow.
  fn promote(
    &self,
    room_id: Uuid,
    user_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Display name from the profile service; `None` when unset or unknown.
  fn display_name(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;
}

// ─── AuditSink ───────────────────────────────────────────────────────────────

/// Append-only audit log. The engine logs and swallows append failures, so
/// implementations never block a primary operation.
pub trait AuditSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn append(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// What gets recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
  CandidateNominated,
  LrCandidateRemoved,
  VotesReset,
  LrSelected,
}

impl AuditAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::CandidateNominated => "candidate_nominated",
      Self::LrCandidateRemoved => "lr_candidate_removed",
      Self::VotesReset => "votes_reset",
      Self::LrSelected => "lr_selected",
    }
  }
}

/// An entry handed to [`AuditSink::append`]; the sink assigns id and
/// timestamp.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub room_id:  Uuid,
  pub actor_id: Uuid,
  pub action:   AuditAction,
  /// Free-form JSON context for the action.
  pub detail:   serde_json::Value,
}
