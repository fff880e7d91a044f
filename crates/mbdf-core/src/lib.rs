//! Core domain model for the MBDF-IT leader-representative election.
//!
//! This crate holds the persisted record types, the scoring and tie engine,
//! the voting-window gate, the capability policy, and the [`engine::ElectionEngine`]
//! that implements every public operation. Storage, the room directory, and
//! the audit log are reached through the traits in [`store`]; this crate has
//! no HTTP or database dependencies.

pub mod candidate;
pub mod engine;
pub mod error;
pub mod policy;
pub mod scoring;
pub mod store;
pub mod vote;
pub mod window;

pub use error::{Error, Result};
