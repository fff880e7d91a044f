//! Handlers for standings and finalization.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rooms/:room_id/standings` | Leaderboard + the requester's ballots; may revert a stale selection |
//! | `POST` | `/rooms/:room_id/finalize` | Body: [`FinalizeBody`]; commits the leader representative |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use mbdf_core::{
  engine::{ElectionEngine, SelectionSnapshot, StandingsView},
  store::{AuditSink, ElectionStore, RoomDirectory},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, requester::RequesterId};

/// `GET /rooms/:room_id/standings`
pub async fn get_view<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path(room_id): Path<Uuid>,
  requester: RequesterId,
) -> Result<Json<StandingsView>, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  Ok(Json(engine.standings(room_id, requester.0).await?))
}

/// JSON body accepted by `POST /rooms/:room_id/finalize`.
#[derive(Debug, Deserialize)]
pub struct FinalizeBody {
  pub candidate_id: Uuid,
}

/// `POST /rooms/:room_id/finalize`
pub async fn finalize<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path(room_id): Path<Uuid>,
  requester: RequesterId,
  Json(body): Json<FinalizeBody>,
) -> Result<Json<SelectionSnapshot>, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  let snapshot =
    engine.finalize(room_id, body.candidate_id, requester.0).await?;
  Ok(Json(snapshot))
}
