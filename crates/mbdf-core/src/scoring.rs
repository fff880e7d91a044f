//! Scoring and tie detection.
//!
//! Standings are derived from the vote ledger on every read and never
//! stored. A candidate's score is the mean over their votes of each vote's
//! five-criterion mean, so every ballot carries equal weight regardless of
//! how many criteria were scored high or low.
//!
//! Averages are compared as exact integer rationals (cross-multiplied
//! score sums and vote counts) rather than floats, so two candidates tie
//! exactly when their averages are mathematically equal. The `f64` average
//! on [`Standing`] is presentation only.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;
use uuid::Uuid;

use crate::{candidate::Candidate, vote::Vote};

/// A candidate's aggregate position, computed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct Standing {
  pub candidate_id:  Uuid,
  pub user_id:       Uuid,
  pub is_selected:   bool,
  /// Mean over this candidate's votes of each vote's five-criterion mean.
  /// Zero when nobody has voted for them.
  pub average_score: f64,
  pub vote_count:    u64,
  #[serde(skip)]
  score_sum: u64,
}

impl Standing {
  /// Total criterion points received across all votes.
  pub fn score_sum(&self) -> u64 {
    self.score_sum
  }

  /// The average as an exact rational `(numerator, denominator)`.
  /// Candidates without votes normalise to `0/1`.
  fn rational(&self) -> (u64, u64) {
    if self.vote_count == 0 {
      (0, 1)
    } else {
      (self.score_sum, 5 * self.vote_count)
    }
  }
}

/// Exact comparison of two standings' averages via cross-multiplication.
pub fn cmp_average(a: &Standing, b: &Standing) -> Ordering {
  let (an, ad) = a.rational();
  let (bn, bd) = b.rational();
  (u128::from(an) * u128::from(bd)).cmp(&(u128::from(bn) * u128::from(ad)))
}

/// Group the ledger by candidate and compute each candidate's standing,
/// ordered best first. Candidates nobody voted for appear with an average
/// of zero; equal averages keep the input (nomination) order.
pub fn compute_standings(
  candidates: &[Candidate],
  votes: &[Vote],
) -> Vec<Standing> {
  let mut tallies: BTreeMap<Uuid, (u64, u64)> = BTreeMap::new();
  for vote in votes {
    let (sum, count) = tallies.entry(vote.candidate_id).or_default();
    *sum += u64::from(vote.scores.sum());
    *count += 1;
  }

  let mut standings: Vec<Standing> = candidates
    .iter()
    .map(|candidate| {
      let (score_sum, vote_count) = tallies
        .get(&candidate.candidate_id)
        .copied()
        .unwrap_or_default();
      let average_score = if vote_count == 0 {
        0.0
      } else {
        score_sum as f64 / (5 * vote_count) as f64
      };
      Standing {
        candidate_id: candidate.candidate_id,
        user_id: candidate.user_id,
        is_selected: candidate.is_selected,
        average_score,
        vote_count,
        score_sum,
      }
    })
    .collect();

  // Stable sort: candidates with equal averages stay in nomination order.
  standings.sort_by(|a, b| cmp_average(b, a));
  standings
}

/// The tied leaders of a room: more than one candidate sharing a strictly
/// positive maximum average.
#[derive(Debug, Clone, Serialize)]
pub struct Tie {
  pub tied:      Vec<Uuid>,
  pub max_score: f64,
}

/// Detect a tie at the top of the leaderboard.
///
/// An all-zero board is never a tie; it means nobody has cast a meaningful
/// vote yet. Vote counts play no part here: a 3.0 average over two votes
/// ties a 3.0 average over one vote.
pub fn detect_tie(standings: &[Standing]) -> Option<Tie> {
  let top = standings.first()?;
  if top.score_sum == 0 {
    return None;
  }
  let tied: Vec<Uuid> = standings
    .iter()
    .take_while(|s| cmp_average(s, top) == Ordering::Equal)
    .map(|s| s.candidate_id)
    .collect();
  if tied.len() > 1 {
    Some(Tie { tied, max_score: top.average_score })
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::vote::Scores;

  fn candidate(user: u128) -> Candidate {
    Candidate {
      candidate_id: Uuid::from_u128(user),
      room_id:      Uuid::from_u128(0xa11),
      user_id:      Uuid::from_u128(user),
      is_selected:  false,
      nominated_at: Utc::now(),
    }
  }

  fn vote(candidate: &Candidate, voter: u128, scores: Scores) -> Vote {
    Vote {
      vote_id:      Uuid::new_v4(),
      room_id:      candidate.room_id,
      voter_id:     Uuid::from_u128(voter),
      candidate_id: candidate.candidate_id,
      scores,
      created_at:   Utc::now(),
      updated_at:   Utc::now(),
    }
  }

  #[test]
  fn averages_over_votes_of_per_vote_means() {
    let a = candidate(1);
    let votes = vec![
      vote(&a, 100, Scores::uniform(5)),
      vote(&a, 101, Scores::uniform(3)),
    ];
    let standings = compute_standings(&[a], &votes);
    assert_eq!(standings.len(), 1);
    assert_eq!(standings[0].vote_count, 2);
    assert!((standings[0].average_score - 4.0).abs() < f64::EPSILON);
  }

  #[test]
  fn unvoted_candidates_appear_with_zero() {
    let a = candidate(1);
    let b = candidate(2);
    let votes = vec![vote(&a, 100, Scores::uniform(4))];
    let standings = compute_standings(&[a, b], &votes);
    assert_eq!(standings[1].candidate_id, Uuid::from_u128(2));
    assert_eq!(standings[1].vote_count, 0);
    assert_eq!(standings[1].average_score, 0.0);
  }

  #[test]
  fn equal_averages_with_different_counts_tie() {
    // A: 3.0 over two votes, B: 3.0 over one vote, C: 2.0 over three.
    let a = candidate(1);
    let b = candidate(2);
    let c = candidate(3);
    let votes = vec![
      vote(&a, 100, Scores::uniform(3)),
      vote(&a, 101, Scores::uniform(3)),
      vote(&b, 102, Scores::uniform(3)),
      vote(&c, 100, Scores::uniform(2)),
      vote(&c, 101, Scores::uniform(2)),
      vote(&c, 102, Scores::uniform(2)),
    ];
    let standings = compute_standings(&[a, b, c], &votes);
    let tie = detect_tie(&standings).unwrap();
    assert_eq!(tie.tied, vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
    assert!((tie.max_score - 3.0).abs() < f64::EPSILON);
  }

  #[test]
  fn fractional_averages_compare_exactly() {
    // A: sum 10 over 2 votes (avg 1.0), B: sum 5 over 1 vote (avg 1.0).
    let a = candidate(1);
    let b = candidate(2);
    let votes = vec![
      vote(&a, 100, Scores::uniform(1)),
      vote(&a, 101, Scores::uniform(1)),
      vote(&b, 102, Scores::uniform(1)),
    ];
    let standings = compute_standings(&[a, b], &votes);
    assert!(detect_tie(&standings).is_some());
  }

  #[test]
  fn all_zero_board_is_not_a_tie() {
    let a = candidate(1);
    let b = candidate(2);
    let votes = vec![
      vote(&a, 100, Scores::uniform(0)),
      vote(&b, 100, Scores::uniform(0)),
    ];
    let standings = compute_standings(&[a, b], &votes);
    assert!(detect_tie(&standings).is_none());
  }

  #[test]
  fn single_leader_is_not_a_tie() {
    let a = candidate(1);
    let b = candidate(2);
    let votes = vec![
      vote(&a, 100, Scores::uniform(4)),
      vote(&b, 100, Scores::uniform(2)),
    ];
    let standings = compute_standings(&[a, b], &votes);
    assert_eq!(standings[0].candidate_id, Uuid::from_u128(1));
    assert!(detect_tie(&standings).is_none());
  }
}
