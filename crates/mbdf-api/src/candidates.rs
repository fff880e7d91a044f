//! Handlers for the candidate registry.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/rooms/:room_id/candidates` | Registry with display names, earliest nomination first |
//! | `POST`   | `/rooms/:room_id/candidates` | Body: [`NominateBody`]; returns 201 + the candidate |
//! | `DELETE` | `/rooms/:room_id/candidates/:candidate_id` | 204; contested removals need an admin |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mbdf_core::{
  engine::{CandidateProfile, ElectionEngine},
  store::{AuditSink, ElectionStore, RoomDirectory},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, requester::RequesterId};

/// `GET /rooms/:room_id/candidates`
pub async fn list<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<CandidateProfile>>, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  Ok(Json(engine.list_candidates(room_id).await?))
}

/// JSON body accepted by `POST /rooms/:room_id/candidates`.
#[derive(Debug, Deserialize)]
pub struct NominateBody {
  /// The user being nominated (not necessarily the requester).
  pub user_id: Uuid,
}

/// `POST /rooms/:room_id/candidates` — returns 201 + the stored candidate.
pub async fn nominate<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path(room_id): Path<Uuid>,
  requester: RequesterId,
  Json(body): Json<NominateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  let candidate = engine.nominate(room_id, body.user_id, requester.0).await?;
  Ok((StatusCode::CREATED, Json(candidate)))
}

/// `DELETE /rooms/:room_id/candidates/:candidate_id`
pub async fn remove<S, D, A>(
  State(engine): State<Arc<ElectionEngine<S, D, A>>>,
  Path((room_id, candidate_id)): Path<(Uuid, Uuid)>,
  requester: RequesterId,
) -> Result<StatusCode, ApiError>
where
  S: ElectionStore,
  D: RoomDirectory,
  A: AuditSink,
{
  engine.remove_candidate(room_id, candidate_id, requester.0).await?;
  Ok(StatusCode::NO_CONTENT)
}
