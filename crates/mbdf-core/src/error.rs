//! Error types for `mbdf-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong inside an election operation.
///
/// Variants fall into four groups: input validation, authorization, state
/// conflicts, and backend failures. [`Error::kind`] gives each a stable
/// machine-readable discriminant for wire payloads.
#[derive(Debug, Error)]
pub enum Error {
  // ─── Validation ──────────────────────────────────────────────────────────
  /// A criterion score outside the 0..=5 range.
  #[error("score '{field}' is {value}; each criterion must be between 0 and 5")]
  InvalidScore { field: &'static str, value: u8 },

  // ─── Authorization ───────────────────────────────────────────────────────
  /// The requester is not a member of the room (or the policy denies the
  /// action for their role).
  #[error("user {0} is not permitted to perform this action in this room")]
  AccessDenied(Uuid),

  /// Candidates are excluded from the electorate of their own election.
  #[error("candidates cannot vote in their own election")]
  CandidatesCannotVote,

  // ─── State conflicts ─────────────────────────────────────────────────────
  #[error("user {user_id} is already a candidate in room {room_id}")]
  AlreadyCandidate { room_id: Uuid, user_id: Uuid },

  #[error("candidate {0} not found in this room")]
  CandidateNotFound(Uuid),

  /// A leader has already been committed; the selection must be reverted
  /// before anything changes.
  #[error("candidate {0} has already been selected as leader representative")]
  AlreadyFinalized(Uuid),

  /// Votes are rejected once any candidate in the room is selected.
  #[error("voting has closed: a leader representative has been selected")]
  VotingClosed,

  #[error("voting has not started yet; it opens at {opens_at}")]
  VotingNotStarted { opens_at: DateTime<Utc> },

  /// A vote arrived before any nomination, so no window exists.
  #[error("no candidates have been nominated in this room")]
  NoCandidates,

  /// Two or more candidates share the nonzero maximum average score.
  #[error("tie detected: {} candidates share the top score of {max_score}", .tied.len())]
  TieDetected { tied: Vec<Uuid>, max_score: f64 },

  /// The leaderboard maximum is zero, which means nobody has cast a
  /// meaningful vote; there is nothing to finalize.
  #[error("no votes have been cast in this room")]
  NoVotesCast,

  /// Removing a candidate who already received votes needs an admin.
  #[error("candidate {candidate_id} has {vote_count} votes; only an admin may remove them")]
  VotingInProgress { candidate_id: Uuid, vote_count: u64 },

  /// A selected leader cannot be removed from the registry.
  #[error("candidate {0} is the selected leader representative and cannot be removed")]
  AlreadySelected(Uuid),

  // ─── Infrastructure ──────────────────────────────────────────────────────
  /// The selection commit or the follow-up role promotion failed partway.
  #[error("finalization failed: {0}")]
  FinalizationFailed(String),

  /// A backend (store, directory, audit) error.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// Stable snake_case discriminant, suitable for API payloads.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::InvalidScore { .. } => "invalid_score",
      Self::AccessDenied(_) => "access_denied",
      Self::CandidatesCannotVote => "candidates_cannot_vote",
      Self::AlreadyCandidate { .. } => "already_candidate",
      Self::CandidateNotFound(_) => "candidate_not_found",
      Self::AlreadyFinalized(_) => "already_finalized",
      Self::VotingClosed => "voting_closed",
      Self::VotingNotStarted { .. } => "voting_not_started",
      Self::NoCandidates => "no_candidates",
      Self::TieDetected { .. } => "tie_detected",
      Self::NoVotesCast => "no_votes_cast",
      Self::VotingInProgress { .. } => "voting_in_progress",
      Self::AlreadySelected(_) => "already_selected",
      Self::FinalizationFailed(_) => "finalization_failed",
      Self::Store(_) => "store_error",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
