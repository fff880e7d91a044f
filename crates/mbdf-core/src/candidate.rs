//! Candidate records: one nomination per (room, user).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A nominated member eligible to receive leader-representative votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub candidate_id: Uuid,
  pub room_id:      Uuid,
  pub user_id:      Uuid,
  /// Set by a successful finalize. At most one candidate per room carries
  /// this flag, and standings reads clear it again if its invariants stop
  /// holding.
  pub is_selected:  bool,
  /// The earliest `nominated_at` in a room anchors the voting window.
  pub nominated_at: DateTime<Utc>,
}

/// Input to [`crate::store::ElectionStore::add_candidate`]; the store assigns
/// the id and nomination timestamp.
#[derive(Debug, Clone, Copy)]
pub struct NewCandidate {
  pub room_id: Uuid,
  pub user_id: Uuid,
}
