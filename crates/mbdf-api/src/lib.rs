//! JSON REST API for the MBDF leader-representative election.
//!
//! Exposes an axum [`Router`] backed by any combination of the core's
//! `ElectionStore` / `RoomDirectory` / `AuditSink` implementations.
//! Authentication and TLS are the surrounding portal's responsibility; the
//! requester's identity arrives as an `x-user-id` header set by the session
//! layer upstream.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mbdf_api::api_router(engine.clone()))
//! ```

pub mod candidates;
pub mod error;
pub mod requester;
pub mod standings;
pub mod votes;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use mbdf_core::{
  engine::ElectionEngine,
  store::{AuditSink, ElectionStore, RoomDirectory},
};
use serde::Deserialize;

pub use error::ApiError;
pub use requester::RequesterId;

/// Server configuration, deserialised from the config file and `MBDF_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, D, A>(engine: Arc<ElectionEngine<S, D, A>>) -> Router<()>
where
  S: ElectionStore + 'static,
  D: RoomDirectory + 'static,
  A: AuditSink + 'static,
{
  Router::new()
    // Candidate registry
    .route(
      "/rooms/{room_id}/candidates",
      get(candidates::list::<S, D, A>).post(candidates::nominate::<S, D, A>),
    )
    .route(
      "/rooms/{room_id}/candidates/{candidate_id}",
      delete(candidates::remove::<S, D, A>),
    )
    // Vote ledger
    .route("/rooms/{room_id}/votes", post(votes::submit::<S, D, A>))
    .route("/rooms/{room_id}/votes/reset", post(votes::reset::<S, D, A>))
    // Standings and finalization
    .route("/rooms/{room_id}/standings", get(standings::get_view::<S, D, A>))
    .route("/rooms/{room_id}/finalize", post(standings::finalize::<S, D, A>))
    .with_state(engine)
}

#[cfg(test)]
mod tests;
