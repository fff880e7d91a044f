//! Voting-window gate.
//!
//! The window is anchored to the earliest nomination in a room: voting opens
//! 60 seconds after it, giving late nominations time to land. The close
//! boundary is computed for display but deliberately not enforced, so a vote
//! that arrives after `closes_at` is still accepted. Only the open boundary
//! rejects votes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Seconds between the first nomination and the window opening.
pub const NOMINATION_LEAD_SECS: i64 = 60;
/// Advertised length of the voting period.
pub const VOTING_PERIOD_SECS: i64 = 60;
/// Display slack added to the advertised close, absorbing clock skew.
pub const CLOSE_TOLERANCE_SECS: i64 = 5;

/// The computed voting window of a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VotingWindow {
  pub opens_at:  DateTime<Utc>,
  /// Advisory only; votes after this instant are still accepted.
  pub closes_at: DateTime<Utc>,
}

impl VotingWindow {
  /// Derive the window from the room's earliest nomination time.
  pub fn from_first_nomination(nominated_at: DateTime<Utc>) -> Self {
    let opens_at = nominated_at + Duration::seconds(NOMINATION_LEAD_SECS);
    let closes_at =
      opens_at + Duration::seconds(VOTING_PERIOD_SECS + CLOSE_TOLERANCE_SECS);
    Self { opens_at, closes_at }
  }

  /// Whether votes are accepted at `now`. A vote at exactly `opens_at`
  /// counts as inside the window; the close boundary is never checked.
  pub fn is_open(&self, now: DateTime<Utc>) -> bool {
    now >= self.opens_at
  }
}
