//! Handlers for the vote ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/rooms/:room_id/votes` | Body: [`VoteBody`]; upserts the requester's ballot, 201 |
//! | `POST` | `/rooms/:room_id/votes/reset` | Clears the room's ledger for a tie re-run |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mbdf_core::{
  engine::ElectionEngine,
  store::{AuditSink, ElectionStore, RoomDirectory},
  vote::{NewVote, Scores},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{error::ApiError, requester::RequesterId};

/// JSON body accepted by `POST /rooms/:room_id/votes`.
#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub candidate_id: Uuid,
  pub scores:       Scores,
}

/// `POST /rooms/:room_id/votes` — the voter is the requester.
pub async fn submit<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path(room_id): Path<Uuid>,
  requester: RequesterId,
  Json(body): Json<VoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  let vote = engine
    .submit_vote(NewVote {
      room_id,
      voter_id: requester.0,
      candidate_id: body.candidate_id,
      scores: body.scores,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(vote)))
}

/// `POST /rooms/:room_id/votes/reset`
pub async fn reset<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path(room_id): Path<Uuid>,
  requester: RequesterId,
) -> Result<impl IntoResponse, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  let deleted = engine.reset_votes(room_id, requester.0).await?;
  Ok(Json(json!({ "votes_deleted": deleted })))
}
