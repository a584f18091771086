//! SurrealDB implementation of [`AttendanceRepository`].
//!
//! Claim insertion is a single `CREATE` guarded by the
//! `idx_attendance_claim` unique index on `(participant_id, session_id)`.
//! No read precedes the write: two concurrent claims for the same pair
//! race inside the storage engine, and exactly one commits.

use chrono::{DateTime, Utc};
use rollcall_core::error::RollcallResult;
use rollcall_core::models::attendance::{AttendanceClaim, CreateAttendanceClaim};
use rollcall_core::repository::{AttendanceRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

/// How many times a claim insert is re-run after the engine reports a
/// retryable commit conflict. A re-run either commits or hits the
/// unique index, so this only bounds pathological contention.
const MAX_CONFLICT_RETRIES: u32 = 16;

#[derive(Debug, SurrealValue)]
struct AttendanceRow {
    participant_id: String,
    session_id: String,
    presenter_id: String,
    session_label: String,
    source_token: String,
    claimed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AttendanceRowWithId {
    record_id: String,
    participant_id: String,
    session_id: String,
    presenter_id: String,
    session_label: String,
    source_token: String,
    claimed_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

impl AttendanceRow {
    fn into_claim(self, id: Uuid) -> Result<AttendanceClaim, DbError> {
        Ok(AttendanceClaim {
            id,
            participant_id: parse_uuid(&self.participant_id, "participant")?,
            session_id: parse_uuid(&self.session_id, "session")?,
            presenter_id: parse_uuid(&self.presenter_id, "presenter")?,
            session_label: self.session_label,
            source_token: self.source_token,
            claimed_at: self.claimed_at,
        })
    }
}

impl AttendanceRowWithId {
    fn try_into_claim(self) -> Result<AttendanceClaim, DbError> {
        let id = parse_uuid(&self.record_id, "record")?;
        AttendanceRow {
            participant_id: self.participant_id,
            session_id: self.session_id,
            presenter_id: self.presenter_id,
            session_label: self.session_label,
            source_token: self.source_token,
            claimed_at: self.claimed_at,
        }
        .into_claim(id)
    }
}

/// SurrealDB implementation of the Attendance repository.
#[derive(Clone)]
pub struct SurrealAttendanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAttendanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn try_record(
        &self,
        id: Uuid,
        input: &CreateAttendanceClaim,
    ) -> Result<AttendanceClaim, DbError> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('attendance', $id) SET \
                 participant_id = $participant_id, \
                 session_id = $session_id, \
                 presenter_id = $presenter_id, \
                 session_label = $session_label, \
                 source_token = $source_token, \
                 claimed_at = $claimed_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("participant_id", input.participant_id.to_string()))
            .bind(("session_id", input.session_id.to_string()))
            .bind(("presenter_id", input.presenter_id.to_string()))
            .bind(("session_label", input.session_label.clone()))
            .bind(("source_token", input.source_token.clone()))
            .bind(("claimed_at", input.claimed_at))
            .await
            .map_err(|e| DbError::from_write("attendance", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("attendance", e))?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "attendance".into(),
            id: id_str,
        })?;

        row.into_claim(id)
    }
}

impl<C: Connection> AttendanceRepository for SurrealAttendanceRepository<C> {
    async fn record(&self, input: CreateAttendanceClaim) -> RollcallResult<AttendanceClaim> {
        let id = Uuid::new_v4();
        let mut retries = 0;

        loop {
            match self.try_record(id, &input).await {
                Err(DbError::Retryable(reason)) if retries < MAX_CONFLICT_RETRIES => {
                    retries += 1;
                    debug!(
                        session_id = %input.session_id,
                        retries,
                        %reason,
                        "Claim insert hit a transaction conflict, re-running"
                    );
                }
                other => return other.map_err(Into::into),
            }
        }
    }

    async fn list_by_session(&self, session_id: Uuid) -> RollcallResult<Vec<AttendanceClaim>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM attendance \
                 WHERE session_id = $session_id \
                 ORDER BY claimed_at ASC",
            )
            .bind(("session_id", session_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_claim().map_err(Into::into))
            .collect()
    }

    async fn list_by_participant(
        &self,
        participant_id: Uuid,
        pagination: Pagination,
    ) -> RollcallResult<PaginatedResult<AttendanceClaim>> {
        let participant_str = participant_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM attendance \
                 WHERE participant_id = $participant_id GROUP ALL",
            )
            .bind(("participant_id", participant_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM attendance \
                 WHERE participant_id = $participant_id \
                 ORDER BY claimed_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("participant_id", participant_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_claim())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_by_presenter(
        &self,
        presenter_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> RollcallResult<u64> {
        let query = if since.is_some() {
            "SELECT count() AS total FROM attendance \
             WHERE presenter_id = $presenter_id AND claimed_at >= $since \
             GROUP ALL"
        } else {
            "SELECT count() AS total FROM attendance \
             WHERE presenter_id = $presenter_id GROUP ALL"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("presenter_id", presenter_id.to_string()));
        if let Some(since) = since {
            builder = builder.bind(("since", since));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_all(&self) -> RollcallResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM attendance GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list_recent(&self, limit: u64) -> RollcallResult<Vec<AttendanceClaim>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM attendance \
                 ORDER BY claimed_at DESC \
                 LIMIT $limit",
            )
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_claim().map_err(Into::into))
            .collect()
    }
}
