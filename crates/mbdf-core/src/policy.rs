//! Room roles and the capability policy.
//!
//! Every operation that needs a role check goes through [`allows`] instead
//! of testing role strings inline, so the whole permission surface is
//! readable (and testable) in one place.

use serde::{Deserialize, Serialize};

/// A member's role within a dossier room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Member,
  /// Leader representative: the elected coordinator of the room's joint
  /// registration dossier.
  Lr,
  Admin,
}

/// An action subject to a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Nominate,
  Vote,
  ViewStandings,
  Finalize,
  ResetVotes,
  /// Removing a candidate nobody has voted for.
  RemoveCandidate,
  /// Removing a candidate who has already received votes.
  RemoveContestedCandidate,
}

/// May a holder of `role` perform `action`?
///
/// The election is deliberately member-driven: any member may nominate,
/// vote, finalize, and reset. Only contested removals are restricted.
pub fn allows(role: Role, action: Action) -> bool {
  match action {
    Action::RemoveContestedCandidate => role == Role::Admin,
    Action::Nominate
    | Action::Vote
    | Action::ViewStandings
    | Action::Finalize
    | Action::ResetVotes
    | Action::RemoveCandidate => true,
  }
}
