//! The election engine: every public operation of the leader-representative
//! election, independent of transport and storage.
//!
//! "Finalized" is a computed property, not a stored state machine. Each
//! standings read revalidates `selected && full turnout && no tie` and
//! eagerly clears a stale selection, so the read path may write. Finalize
//! and reset serialise per room on an in-process advisory lock, which closes
//! the race where two members finalize different candidates at once.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  candidate::{Candidate, NewCandidate},
  error::{Error, Result},
  policy::{self, Action, Role},
  scoring::{self, Standing},
  store::{AuditAction, AuditSink, ElectionStore, NewAuditEntry, RoomDirectory},
  vote::{NewVote, Vote},
  window::VotingWindow,
};

/// A room's standings plus the caller's own ballots.
#[derive(Debug, Clone, Serialize)]
pub struct StandingsView {
  /// Best candidate first; equal averages keep nomination order.
  pub results:      Vec<Standing>,
  /// The requesting user's votes in this room, one per candidate scored.
  pub my_votes:     Vec<Vote>,
  pub is_finalized: bool,
  /// Absent until the first nomination creates the window.
  pub window:       Option<VotingWindow>,
}

/// What a successful finalize returns: the committed candidate and their
/// score at the moment of selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionSnapshot {
  pub candidate_id:   Uuid,
  /// Display name from the directory, falling back to the user id.
  pub candidate_name: String,
  pub total_score:    f64,
  pub vote_count:     u64,
}

/// A registry listing entry with the display name joined in.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateProfile {
  #[serde(flatten)]
  pub candidate:    Candidate,
  pub display_name: Option<String>,
}

/// Per-room advisory locks. Entries are never reclaimed; rooms are few and
/// a parked mutex is tiny.
#[derive(Default)]
struct RoomLocks {
  inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl RoomLocks {
  async fn get(&self, room_id: Uuid) -> Arc<Mutex<()>> {
    let mut locks = self.inner.lock().await;
    Arc::clone(locks.entry(room_id).or_default())
  }
}

/// The election engine, generic over its three consumed interfaces.
pub struct ElectionEngine<S, D, A> {
  store:     Arc<S>,
  directory: Arc<D>,
  audit:     Arc<A>,
  locks:     RoomLocks,
}

impl<S, D, A> ElectionEngine<S, D, A>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  pub fn new(store: Arc<S>, directory: Arc<D>, audit: Arc<A>) -> Self {
    Self {
      store,
      directory,
      audit,
      locks: RoomLocks::default(),
    }
  }

  // ─── Candidate registry ──────────────────────────────────────────────────

  /// Nominate `user_id` in `room_id`. Nominee membership is not checked;
  /// the portal nominates from its own member list.
  pub async fn nominate(
    &self,
    room_id: Uuid,
    user_id: Uuid,
    nominator_id: Uuid,
  ) -> Result<Candidate> {
    if self
      .store
      .candidate_for_user(room_id, user_id)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::AlreadyCandidate { room_id, user_id });
    }

    let candidate = self
      .store
      .add_candidate(NewCandidate { room_id, user_id })
      .await
      .map_err(Error::store)?;

    info!(%room_id, %user_id, candidate_id = %candidate.candidate_id, "candidate nominated");
    self
      .record_audit(NewAuditEntry {
        room_id,
        actor_id: nominator_id,
        action: AuditAction::CandidateNominated,
        detail: serde_json::json!({
          "candidate_id": candidate.candidate_id,
          "user_id": user_id,
        }),
      })
      .await;

    Ok(candidate)
  }

  /// The room's candidates, earliest nomination first, with display names
  /// joined from the directory.
  pub async fn list_candidates(
    &self,
    room_id: Uuid,
  ) -> Result<Vec<CandidateProfile>> {
    let candidates = self
      .store
      .list_candidates(room_id)
      .await
      .map_err(Error::store)?;

    let mut profiles = Vec::with_capacity(candidates.len());
    for candidate in candidates {
      let display_name = self
        .directory
        .display_name(candidate.user_id)
        .await
        .map_err(Error::store)?;
      profiles.push(CandidateProfile { candidate, display_name });
    }
    Ok(profiles)
  }

  /// Withdraw a candidacy. A candidate with votes can only be removed by a
  /// role the policy allows; removing them deletes their votes too. The
  /// selected leader cannot be removed at all.
  pub async fn remove_candidate(
    &self,
    room_id: Uuid,
    candidate_id: Uuid,
    requester_id: Uuid,
  ) -> Result<()> {
    let candidate = self
      .store
      .candidate(candidate_id)
      .await
      .map_err(Error::store)?
      .filter(|c| c.room_id == room_id)
      .ok_or(Error::CandidateNotFound(candidate_id))?;

    if candidate.is_selected {
      return Err(Error::AlreadySelected(candidate_id));
    }

    let vote_count = self
      .store
      .vote_count_for_candidate(candidate_id)
      .await
      .map_err(Error::store)?;
    if vote_count > 0 {
      let role = self
        .directory
        .membership(room_id, requester_id)
        .await
        .map_err(Error::store)?;
      let allowed = role
        .is_some_and(|r| policy::allows(r, Action::RemoveContestedCandidate));
      if !allowed {
        return Err(Error::VotingInProgress { candidate_id, vote_count });
      }
    }

    let votes_deleted = self
      .store
      .remove_candidate(candidate_id)
      .await
      .map_err(Error::store)?;

    info!(%room_id, %candidate_id, votes_deleted, "candidate removed");
    self
      .record_audit(NewAuditEntry {
        room_id,
        actor_id: requester_id,
        action: AuditAction::LrCandidateRemoved,
        detail: serde_json::json!({
          "candidate_id": candidate_id,
          "user_id": candidate.user_id,
          "votes_deleted": votes_deleted,
        }),
      })
      .await;

    Ok(())
  }

  // ─── Vote ledger ─────────────────────────────────────────────────────────

  /// Record or overwrite the voter's scores for one candidate.
  pub async fn submit_vote(&self, input: NewVote) -> Result<Vote> {
    input.scores.validate()?;
    self
      .require(input.room_id, input.voter_id, Action::Vote)
      .await?;

    if self
      .store
      .candidate_for_user(input.room_id, input.voter_id)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::CandidatesCannotVote);
    }

    let candidates = self
      .store
      .list_candidates(input.room_id)
      .await
      .map_err(Error::store)?;

    if candidates.iter().any(|c| c.is_selected) {
      return Err(Error::VotingClosed);
    }

    let first = candidates.first().ok_or(Error::NoCandidates)?;
    let window = VotingWindow::from_first_nomination(first.nominated_at);
    if !window.is_open(Utc::now()) {
      return Err(Error::VotingNotStarted { opens_at: window.opens_at });
    }

    if !candidates.iter().any(|c| c.candidate_id == input.candidate_id) {
      return Err(Error::CandidateNotFound(input.candidate_id));
    }

    self.store.upsert_vote(input).await.map_err(Error::store)
  }

  /// Clear the room's vote ledger so a tie can be re-run. Candidates and
  /// nominations are untouched.
  pub async fn reset_votes(
    &self,
    room_id: Uuid,
    requester_id: Uuid,
  ) -> Result<u64> {
    self.require(room_id, requester_id, Action::ResetVotes).await?;

    let room_lock = self.locks.get(room_id).await;
    let _guard = room_lock.lock().await;

    let deleted = self
      .store
      .delete_room_votes(room_id)
      .await
      .map_err(Error::store)?;

    info!(%room_id, deleted, "vote ledger reset");
    self
      .record_audit(NewAuditEntry {
        room_id,
        actor_id: requester_id,
        action: AuditAction::VotesReset,
        detail: serde_json::json!({
          "reason": "tie_detected",
          "votes_deleted": deleted,
        }),
      })
      .await;

    Ok(deleted)
  }

  // ─── Standings ───────────────────────────────────────────────────────────

  /// Compute the room's standings for `requesting_user_id`.
  ///
  /// Not a pure read: if a selection exists whose invariants no longer hold
  /// (turnout fell below 100% because a member joined, or a tie emerged),
  /// the stale flag is cleared here before the view is returned.
  pub async fn standings(
    &self,
    room_id: Uuid,
    requesting_user_id: Uuid,
  ) -> Result<StandingsView> {
    let candidates = self
      .store
      .list_candidates(room_id)
      .await
      .map_err(Error::store)?;
    let votes = self
      .store
      .votes_for_room(room_id)
      .await
      .map_err(Error::store)?;

    let window = candidates
      .first()
      .map(|c| VotingWindow::from_first_nomination(c.nominated_at));
    let mut results = scoring::compute_standings(&candidates, &votes);
    let tie = scoring::detect_tie(&results);

    let mut is_finalized = false;
    if let Some(selected) = candidates.iter().find(|c| c.is_selected) {
      let voters: HashSet<Uuid> = votes.iter().map(|v| v.voter_id).collect();
      let members =
        self.directory.member_count(room_id).await.map_err(Error::store)?;
      if voters.len() as u64 >= members && tie.is_none() {
        is_finalized = true;
      } else {
        // Turnout regressed or a tie emerged since the selection was
        // committed; un-finalize the room as part of this read.
        self.store.clear_selected(room_id).await.map_err(Error::store)?;
        for standing in &mut results {
          standing.is_selected = false;
        }
        info!(
          %room_id,
          candidate_id = %selected.candidate_id,
          "stale selection reverted"
        );
      }
    }

    let my_votes = votes
      .iter()
      .filter(|v| v.voter_id == requesting_user_id)
      .cloned()
      .collect();

    Ok(StandingsView { results, my_votes, is_finalized, window })
  }

  // ─── Finalization ────────────────────────────────────────────────────────

  /// Commit `candidate_id` as the room's leader representative.
  ///
  /// The selection itself is one atomic store transaction (unselect all,
  /// select one); the role promotion follows under the room lock, and a
  /// failed promotion rolls the selection back on a best-effort basis.
  pub async fn finalize(
    &self,
    room_id: Uuid,
    candidate_id: Uuid,
    requester_id: Uuid,
  ) -> Result<SelectionSnapshot> {
    self.require(room_id, requester_id, Action::Finalize).await?;

    let room_lock = self.locks.get(room_id).await;
    let _guard = room_lock.lock().await;

    let candidates = self
      .store
      .list_candidates(room_id)
      .await
      .map_err(Error::store)?;
    let target = candidates
      .iter()
      .find(|c| c.candidate_id == candidate_id)
      .ok_or(Error::CandidateNotFound(candidate_id))?;
    if target.is_selected {
      return Err(Error::AlreadyFinalized(candidate_id));
    }

    let votes = self
      .store
      .votes_for_room(room_id)
      .await
      .map_err(Error::store)?;
    let standings = scoring::compute_standings(&candidates, &votes);

    if let Some(tie) = scoring::detect_tie(&standings) {
      return Err(Error::TieDetected {
        tied:      tie.tied,
        max_score: tie.max_score,
      });
    }
    if standings.first().is_none_or(|top| top.score_sum() == 0) {
      return Err(Error::NoVotesCast);
    }
    let standing = standings
      .iter()
      .find(|s| s.candidate_id == candidate_id)
      .ok_or(Error::CandidateNotFound(candidate_id))?;

    self
      .store
      .mark_selected(room_id, candidate_id)
      .await
      .map_err(|e| Error::FinalizationFailed(e.to_string()))?;

    if let Err(e) = self
      .directory
      .promote(room_id, target.user_id, Role::Lr)
      .await
    {
      // Roll the selection back so the room is not left half-finalized.
      if let Err(revert) = self.store.clear_selected(room_id).await {
        warn!(
          %room_id,
          error = %revert,
          "failed to revert selection after promotion failure"
        );
      }
      return Err(Error::FinalizationFailed(e.to_string()));
    }

    let candidate_name = match self.directory.display_name(target.user_id).await
    {
      Ok(Some(name)) => name,
      Ok(None) => target.user_id.to_string(),
      Err(e) => {
        warn!(user_id = %target.user_id, error = %e, "display name lookup failed");
        target.user_id.to_string()
      }
    };

    let snapshot = SelectionSnapshot {
      candidate_id,
      candidate_name,
      total_score: standing.average_score,
      vote_count: standing.vote_count,
    };

    info!(
      %room_id,
      %candidate_id,
      score = snapshot.total_score,
      votes = snapshot.vote_count,
      "leader representative selected"
    );
    self
      .record_audit(NewAuditEntry {
        room_id,
        actor_id: requester_id,
        action: AuditAction::LrSelected,
        detail: serde_json::to_value(&snapshot).unwrap_or_default(),
      })
      .await;

    Ok(snapshot)
  }

  // ─── Helpers ─────────────────────────────────────────────────────────────

  /// Resolve the requester's role and check it against the policy.
  async fn require(
    &self,
    room_id: Uuid,
    user_id: Uuid,
    action: Action,
  ) -> Result<Role> {
    let role = self
      .directory
      .membership(room_id, user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AccessDenied(user_id))?;
    if !policy::allows(role, action) {
      return Err(Error::AccessDenied(user_id));
    }
    Ok(role)
  }

  /// Append an audit entry; failures are logged and swallowed so auditing
  /// never blocks the primary operation.
  async fn record_audit(&self, entry: NewAuditEntry) {
    let action = entry.action;
    if let Err(e) = self.audit.append(entry).await {
      warn!(action = action.as_str(), error = %e, "audit append failed");
    }
  }
}
