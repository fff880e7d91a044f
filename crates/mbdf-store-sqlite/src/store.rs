//! [`SqliteStore`] — the SQLite implementation of the election engine's
//! consumed interfaces.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use mbdf_core::{
  candidate::{Candidate, NewCandidate},
  policy::Role,
  store::{AuditSink, ElectionStore, NewAuditEntry, RoomDirectory},
  vote::{NewVote, Vote},
};

use crate::{
  Error, Result,
  encode::{
    RawCandidate, RawVote, decode_dt, decode_role, decode_uuid, encode_dt,
    encode_role, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An MBDF election store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ─── Directory administration ────────────────────────────────────────────
  //
  // In production the portal owns these tables; the helpers below exist so
  // the service is runnable and testable on its own.

  /// Add (or re-role) a room member.
  pub async fn add_member(
    &self,
    room_id: Uuid,
    user_id: Uuid,
    role: Role,
  ) -> Result<()> {
    let room_str = encode_uuid(room_id);
    let user_str = encode_uuid(user_id);
    let role_str = encode_role(role);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO room_members (room_id, user_id, role)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (room_id, user_id) DO UPDATE SET role = excluded.role",
          rusqlite::params![room_str, user_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Set a user's display name in the profile table.
  pub async fn set_display_name(
    &self,
    user_id: Uuid,
    display_name: &str,
  ) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let name = display_name.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (user_id, display_name)
           VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET display_name = excluded.display_name",
          rusqlite::params![user_str, name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read a room's audit trail, oldest entry first.
  pub async fn audit_log(&self, room_id: Uuid) -> Result<Vec<AuditRecord>> {
    let room_str = encode_uuid(room_id);
    let rows: Vec<(String, String, String, String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, room_id, actor_id, action, detail, recorded_at
           FROM audit_log WHERE room_id = ?1
           ORDER BY recorded_at ASC, entry_id ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![room_str], |r| {
            Ok((
              r.get(0)?,
              r.get(1)?,
              r.get(2)?,
              r.get(3)?,
              r.get(4)?,
              r.get(5)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(entry_id, room_id, actor_id, action, detail, recorded_at)| {
        Ok(AuditRecord {
          entry_id:    decode_uuid(&entry_id)?,
          room_id:     decode_uuid(&room_id)?,
          actor_id:    decode_uuid(&actor_id)?,
          action,
          detail:      serde_json::from_str(&detail)?,
          recorded_at: decode_dt(&recorded_at)?,
        })
      })
      .collect()
  }

  #[cfg(test)]
  pub(crate) async fn backdate_nomination(
    &self,
    candidate_id: Uuid,
    nominated_at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str = encode_uuid(candidate_id);
    let at_str = encode_dt(nominated_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE candidates SET nominated_at = ?2 WHERE candidate_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// A decoded `audit_log` row.
#[derive(Debug, Clone)]
pub struct AuditRecord {
  pub entry_id:    Uuid,
  pub room_id:     Uuid,
  pub actor_id:    Uuid,
  pub action:      String,
  pub detail:      serde_json::Value,
  pub recorded_at: DateTime<Utc>,
}

const CANDIDATE_COLS: &str =
  "candidate_id, room_id, user_id, is_selected, nominated_at";
const VOTE_COLS: &str = "vote_id, room_id, voter_id, candidate_id, technical, \
                         experience, availability, communication, leadership, \
                         created_at, updated_at";

fn candidate_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCandidate> {
  Ok(RawCandidate {
    candidate_id: row.get(0)?,
    room_id:      row.get(1)?,
    user_id:      row.get(2)?,
    is_selected:  row.get(3)?,
    nominated_at: row.get(4)?,
  })
}

fn vote_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVote> {
  Ok(RawVote {
    vote_id:       row.get(0)?,
    room_id:       row.get(1)?,
    voter_id:      row.get(2)?,
    candidate_id:  row.get(3)?,
    technical:     row.get(4)?,
    experience:    row.get(5)?,
    availability:  row.get(6)?,
    communication: row.get(7)?,
    leadership:    row.get(8)?,
    created_at:    row.get(9)?,
    updated_at:    row.get(10)?,
  })
}

fn is_constraint_violation(err: &Error) -> bool {
  matches!(
    err,
    Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(e, _),
    )) if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── ElectionStore ───────────────────────────────────────────────────────────

impl ElectionStore for SqliteStore {
  type Error = Error;

  async fn add_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    let candidate = Candidate {
      candidate_id: Uuid::new_v4(),
      room_id:      input.room_id,
      user_id:      input.user_id,
      is_selected:  false,
      nominated_at: Utc::now(),
    };

    let id_str = encode_uuid(candidate.candidate_id);
    let room_str = encode_uuid(candidate.room_id);
    let user_str = encode_uuid(candidate.user_id);
    let at_str = encode_dt(candidate.nominated_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO candidates
             (candidate_id, room_id, user_id, is_selected, nominated_at)
           VALUES (?1, ?2, ?3, 0, ?4)",
          rusqlite::params![id_str, room_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::Database);

    match inserted {
      Ok(()) => Ok(candidate),
      Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateCandidate {
        room_id: input.room_id,
        user_id: input.user_id,
      }),
      Err(e) => Err(e),
    }
  }

  async fn candidate(&self, candidate_id: Uuid) -> Result<Option<Candidate>> {
    let id_str = encode_uuid(candidate_id);
    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {CANDIDATE_COLS} FROM candidates WHERE candidate_id = ?1"
            ),
            rusqlite::params![id_str],
            candidate_from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn candidate_for_user(
    &self,
    room_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Candidate>> {
    let room_str = encode_uuid(room_id);
    let user_str = encode_uuid(user_id);
    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {CANDIDATE_COLS} FROM candidates
               WHERE room_id = ?1 AND user_id = ?2"
            ),
            rusqlite::params![room_str, user_str],
            candidate_from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn list_candidates(&self, room_id: Uuid) -> Result<Vec<Candidate>> {
    let room_str = encode_uuid(room_id);
    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CANDIDATE_COLS} FROM candidates
           WHERE room_id = ?1
           ORDER BY nominated_at ASC, candidate_id ASC"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![room_str], candidate_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn mark_selected(&self, room_id: Uuid, candidate_id: Uuid) -> Result<()> {
    let room_str = encode_uuid(room_id);
    let id_str = encode_uuid(candidate_id);
    let updated: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE candidates SET is_selected = 0 WHERE room_id = ?1",
          rusqlite::params![room_str],
        )?;
        let updated = tx.execute(
          "UPDATE candidates SET is_selected = 1
           WHERE candidate_id = ?1 AND room_id = ?2",
          rusqlite::params![id_str, room_str],
        )?;
        // Dropping the transaction without commit rolls everything back,
        // including the unselect above.
        if updated == 1 {
          tx.commit()?;
        }
        Ok(updated)
      })
      .await?;

    if updated != 1 {
      return Err(Error::CandidateNotFound(candidate_id));
    }
    Ok(())
  }

  async fn clear_selected(&self, room_id: Uuid) -> Result<bool> {
    let room_str = encode_uuid(room_id);
    let cleared: usize = self
      .conn
      .call(move |conn| {
        let cleared = conn.execute(
          "UPDATE candidates SET is_selected = 0
           WHERE room_id = ?1 AND is_selected = 1",
          rusqlite::params![room_str],
        )?;
        Ok(cleared)
      })
      .await?;
    Ok(cleared > 0)
  }

  async fn remove_candidate(&self, candidate_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(candidate_id);
    let result: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let votes_deleted = tx.execute(
          "DELETE FROM votes WHERE candidate_id = ?1",
          rusqlite::params![id_str],
        )?;
        let removed = tx.execute(
          "DELETE FROM candidates WHERE candidate_id = ?1",
          rusqlite::params![id_str],
        )?;
        if removed == 0 {
          return Ok(None);
        }
        tx.commit()?;
        Ok(Some(votes_deleted))
      })
      .await?;

    result
      .map(|n| n as u64)
      .ok_or(Error::CandidateNotFound(candidate_id))
  }

  async fn upsert_vote(&self, input: NewVote) -> Result<Vote> {
    let now = Utc::now();
    let vote_id_str = encode_uuid(Uuid::new_v4());
    let room_str = encode_uuid(input.room_id);
    let voter_str = encode_uuid(input.voter_id);
    let cand_str = encode_uuid(input.candidate_id);
    let now_str = encode_dt(now);
    let scores = input.scores;

    let raw: RawVote = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO votes
             (vote_id, room_id, voter_id, candidate_id,
              technical, experience, availability, communication, leadership,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
           ON CONFLICT (room_id, voter_id, candidate_id) DO UPDATE SET
             technical     = excluded.technical,
             experience    = excluded.experience,
             availability  = excluded.availability,
             communication = excluded.communication,
             leadership    = excluded.leadership,
             updated_at    = excluded.updated_at",
          rusqlite::params![
            vote_id_str,
            room_str,
            voter_str,
            cand_str,
            scores.technical,
            scores.experience,
            scores.availability,
            scores.communication,
            scores.leadership,
            now_str,
          ],
        )?;
        // Read the row back: on conflict the stored vote_id and created_at
        // are the original ones, not the values we just generated.
        let raw = conn.query_row(
          &format!(
            "SELECT {VOTE_COLS} FROM votes
             WHERE room_id = ?1 AND voter_id = ?2 AND candidate_id = ?3"
          ),
          rusqlite::params![room_str, voter_str, cand_str],
          vote_from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_vote()
  }

  async fn votes_for_room(&self, room_id: Uuid) -> Result<Vec<Vote>> {
    let room_str = encode_uuid(room_id);
    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOTE_COLS} FROM votes
           WHERE room_id = ?1
           ORDER BY created_at ASC, vote_id ASC"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![room_str], vote_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawVote::into_vote).collect()
  }

  async fn vote_count_for_candidate(&self, candidate_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(candidate_id);
    let count: i64 = self
      .conn
      .call(move |conn| {
        let count = conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE candidate_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        Ok(count)
      })
      .await?;
    Ok(count as u64)
  }

  async fn delete_room_votes(&self, room_id: Uuid) -> Result<u64> {
    let room_str = encode_uuid(room_id);
    let deleted: usize = self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM votes WHERE room_id = ?1",
          rusqlite::params![room_str],
        )?;
        Ok(deleted)
      })
      .await?;
    Ok(deleted as u64)
  }
}

// ─── RoomDirectory ───────────────────────────────────────────────────────────

impl RoomDirectory for SqliteStore {
  type Error = Error;

  async fn membership(
    &self,
    room_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<Role>> {
    let room_str = encode_uuid(room_id);
    let user_str = encode_uuid(user_id);
    let role_str: Option<String> = self
      .conn
      .call(move |conn| {
        let role = conn
          .query_row(
            "SELECT role FROM room_members WHERE room_id = ?1 AND user_id = ?2",
            rusqlite::params![room_str, user_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(role)
      })
      .await?;
    role_str.as_deref().map(decode_role).transpose()
  }

  async fn member_count(&self, room_id: Uuid) -> Result<u64> {
    let room_str = encode_uuid(room_id);
    let count: i64 = self
      .conn
      .call(move |conn| {
        let count = conn.query_row(
          "SELECT COUNT(*) FROM room_members WHERE room_id = ?1",
          rusqlite::params![room_str],
          |r| r.get(0),
        )?;
        Ok(count)
      })
      .await?;
    Ok(count as u64)
  }

  async fn promote(&self, room_id: Uuid, user_id: Uuid, role: Role) -> Result<()> {
    let room_str = encode_uuid(room_id);
    let user_str = encode_uuid(user_id);
    let role_str = encode_role(role);
    // Updating a non-member is a no-op: membership rows are owned by the
    // portal, and the engine treats promotion as advisory.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE room_members SET role = ?3
           WHERE room_id = ?1 AND user_id = ?2",
          rusqlite::params![room_str, user_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn display_name(&self, user_id: Uuid) -> Result<Option<String>> {
    let user_str = encode_uuid(user_id);
    let name: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        let name = conn
          .query_row(
            "SELECT display_name FROM profiles WHERE user_id = ?1",
            rusqlite::params![user_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok(name)
      })
      .await?;
    Ok(name.flatten())
  }
}

// ─── AuditSink ───────────────────────────────────────────────────────────────

impl AuditSink for SqliteStore {
  type Error = Error;

  async fn append(&self, entry: NewAuditEntry) -> Result<()> {
    let entry_str = encode_uuid(Uuid::new_v4());
    let room_str = encode_uuid(entry.room_id);
    let actor_str = encode_uuid(entry.actor_id);
    let action = entry.action.as_str();
    let detail = serde_json::to_string(&entry.detail)?;
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log
             (entry_id, room_id, actor_id, action, detail, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![entry_str, room_str, actor_str, action, detail, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
