//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape
//! `{"error": {"kind": "...", "message": "..."}}`; state-conflict errors
//! that the UI can act on (ties, closed windows) carry extra fields next to
//! `kind` and `message`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use mbdf_core::Error as ElectionError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error(transparent)]
  Election(#[from] ElectionError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error) = match &self {
      ApiError::Unauthorized(m) => (
        StatusCode::UNAUTHORIZED,
        json!({ "kind": "unauthorized", "message": m }),
      ),
      ApiError::Election(e) => (election_status(e), election_body(e)),
    };

    if status.is_server_error() {
      tracing::error!(%status, error = %self, "request failed");
    }

    (status, Json(json!({ "error": error }))).into_response()
  }
}

fn election_status(e: &ElectionError) -> StatusCode {
  use ElectionError as E;
  match e {
    E::InvalidScore { .. } => StatusCode::BAD_REQUEST,
    E::AccessDenied(_) | E::CandidatesCannotVote => StatusCode::FORBIDDEN,
    E::CandidateNotFound(_) => StatusCode::NOT_FOUND,
    E::AlreadyCandidate { .. }
    | E::AlreadyFinalized(_)
    | E::VotingClosed
    | E::VotingNotStarted { .. }
    | E::NoCandidates
    | E::TieDetected { .. }
    | E::NoVotesCast
    | E::VotingInProgress { .. }
    | E::AlreadySelected(_) => StatusCode::CONFLICT,
    E::FinalizationFailed(_) | E::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn election_body(e: &ElectionError) -> serde_json::Value {
  use ElectionError as E;
  let mut error = json!({ "kind": e.kind(), "message": e.to_string() });
  match e {
    E::TieDetected { tied, max_score } => {
      error["tied"] = json!(tied);
      error["max_score"] = json!(max_score);
    }
    E::VotingNotStarted { opens_at } => {
      error["opens_at"] = json!(opens_at);
    }
    E::VotingInProgress { vote_count, .. } => {
      error["vote_count"] = json!(vote_count);
    }
    _ => {}
  }
  error
}
