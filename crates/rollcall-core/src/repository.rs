//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations must enforce the
//! uniqueness constraints documented on each `create`/`record` method
//! inside the store itself, not by a read before the write.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RollcallResult;
use crate::models::{
    attendance::{AttendanceClaim, CreateAttendanceClaim},
    session::{CreateSession, EndReason, Session},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub trait SessionRepository: Send + Sync {
    /// Insert a new active session.
    ///
    /// Fails with `AlreadyExists` if another session already carries the
    /// same token.
    fn create(&self, input: CreateSession) -> impl Future<Output = RollcallResult<Session>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RollcallResult<Session>> + Send;

    /// Look up a session by token, whether active or not.
    fn get_by_token(&self, token: &str) -> impl Future<Output = RollcallResult<Session>> + Send;

    /// Sessions owned by a presenter, newest first.
    fn list_by_presenter(
        &self,
        presenter_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RollcallResult<PaginatedResult<Session>>> + Send;

    /// Mark a session inactive if it is still active.
    ///
    /// Returns `true` if this call performed the transition, `false` if
    /// the session was already inactive.
    fn end(
        &self,
        id: Uuid,
        reason: EndReason,
        at: DateTime<Utc>,
    ) -> impl Future<Output = RollcallResult<bool>> + Send;

    /// Mark every active session whose window closed at or before `now`
    /// as inactive with [`EndReason::Expired`]. Returns the number ended.
    fn end_expired(&self, now: DateTime<Utc>) -> impl Future<Output = RollcallResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

pub trait AttendanceRepository: Send + Sync {
    /// Atomically insert a claim.
    ///
    /// Fails with `AlreadyExists` if a claim for the same
    /// `(participant_id, session_id)` already exists, including when the
    /// competing insert is concurrent.
    fn record(
        &self,
        input: CreateAttendanceClaim,
    ) -> impl Future<Output = RollcallResult<AttendanceClaim>> + Send;

    /// Claims for one session, oldest first.
    fn list_by_session(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceClaim>>> + Send;

    /// Claims made by one participant, newest first.
    fn list_by_participant(
        &self,
        participant_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RollcallResult<PaginatedResult<AttendanceClaim>>> + Send;

    /// Number of claims on a presenter's sessions, optionally only those
    /// made at or after `since`.
    fn count_by_presenter(
        &self,
        presenter_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> impl Future<Output = RollcallResult<u64>> + Send;

    /// Number of claims across all sessions.
    fn count_all(&self) -> impl Future<Output = RollcallResult<u64>> + Send;

    /// Most recent claims across all sessions.
    fn list_recent(
        &self,
        limit: u64,
    ) -> impl Future<Output = RollcallResult<Vec<AttendanceClaim>>> + Send;
}
