//! Vote records and the five-criterion score card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Upper bound for each criterion score.
pub const MAX_SCORE: u8 = 5;

/// The five weighted criteria scored on every ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
  pub technical:     u8,
  pub experience:    u8,
  pub availability:  u8,
  pub communication: u8,
  pub leadership:    u8,
}

impl Scores {
  /// All five criteria set to the same value. Handy for fixtures.
  pub fn uniform(value: u8) -> Self {
    Self {
      technical:     value,
      experience:    value,
      availability:  value,
      communication: value,
      leadership:    value,
    }
  }

  /// Named criterion values, in the order they are summed.
  pub fn fields(&self) -> [(&'static str, u8); 5] {
    [
      ("technical", self.technical),
      ("experience", self.experience),
      ("availability", self.availability),
      ("communication", self.communication),
      ("leadership", self.leadership),
    ]
  }

  /// Reject any criterion above [`MAX_SCORE`]. The lower bound is enforced
  /// by the unsigned type.
  pub fn validate(&self) -> Result<()> {
    for (field, value) in self.fields() {
      if value > MAX_SCORE {
        return Err(Error::InvalidScore { field, value });
      }
    }
    Ok(())
  }

  /// Sum of the five criteria; this vote's average is `sum / 5`.
  pub fn sum(&self) -> u32 {
    self.fields().iter().map(|(_, v)| u32::from(*v)).sum()
  }
}

/// A stored score-vote. Unique per (room, voter, candidate); resubmission
/// overwrites the scores in place, keeping the original id and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
  pub vote_id:      Uuid,
  pub room_id:      Uuid,
  pub voter_id:     Uuid,
  pub candidate_id: Uuid,
  pub scores:       Scores,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::ElectionStore::upsert_vote`].
#[derive(Debug, Clone, Copy)]
pub struct NewVote {
  pub room_id:      Uuid,
  pub voter_id:     Uuid,
  pub candidate_id: Uuid,
  pub scores:       Scores,
}
