//! Claim arbitration and attendance reporting.

use chrono::{DateTime, NaiveTime, Utc};
use rollcall_core::clock::Clock;
use rollcall_core::error::RollcallError;
use rollcall_core::models::attendance::{AttendanceClaim, CreateAttendanceClaim};
use rollcall_core::repository::{
    AttendanceRepository, PaginatedResult, Pagination, SessionRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AttendanceError;
use crate::payload;
use crate::registry::SessionRegistry;

/// Confirmation returned for a successful claim.
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub claim_id: Uuid,
    pub session_id: Uuid,
    /// Label of the claimed session, for the confirmation message.
    pub session_label: String,
    pub claimed_at: DateTime<Utc>,
}

/// Claim totals for a presenter's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterSummary {
    pub total_claims: u64,
    /// Claims since UTC midnight of the current day.
    pub claims_today: u64,
}

/// Records attendance claims, at most one per participant per session.
pub struct AttendanceLedger<S: SessionRepository, A: AttendanceRepository, C: Clock> {
    registry: SessionRegistry<S, C>,
    attendance_repo: A,
}

impl<S: SessionRepository, A: AttendanceRepository, C: Clock> AttendanceLedger<S, A, C> {
    pub fn new(registry: SessionRegistry<S, C>, attendance_repo: A) -> Self {
        Self {
            registry,
            attendance_repo,
        }
    }

    pub fn registry(&self) -> &SessionRegistry<S, C> {
        &self.registry
    }

    /// Claim presence in the session identified by `token`.
    ///
    /// The claim is keyed by the session's identity, never its label. The
    /// insert is a single atomic store operation; if a claim for the pair
    /// already exists, or a concurrent one wins, the result is
    /// [`AttendanceError::DuplicateClaim`] and nothing is written.
    pub async fn mark_attendance(
        &self,
        participant_id: Uuid,
        token: &str,
    ) -> Result<ClaimReceipt, AttendanceError> {
        // 1. Resolve the token; its errors pass through untouched.
        let session = self.registry.resolve_token(token).await?;

        // 2. Insert-if-absent on (participant_id, session_id).
        let input = CreateAttendanceClaim {
            participant_id,
            session_id: session.id,
            presenter_id: session.presenter_id,
            session_label: session.label,
            source_token: token.to_string(),
            claimed_at: self.registry.clock().now(),
        };

        let claim = match self.attendance_repo.record(input).await {
            Ok(claim) => claim,
            Err(RollcallError::AlreadyExists { .. }) => {
                debug!(
                    session_id = %session.id,
                    participant_id = %participant_id,
                    "Duplicate attendance claim rejected"
                );
                return Err(AttendanceError::DuplicateClaim);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            claim_id = %claim.id,
            session_id = %claim.session_id,
            participant_id = %participant_id,
            "Attendance recorded"
        );

        Ok(ClaimReceipt {
            claim_id: claim.id,
            session_id: claim.session_id,
            session_label: claim.session_label,
            claimed_at: claim.claimed_at,
        })
    }

    /// Claim presence from a decoded `SESSION_TOKEN:<token>` payload.
    pub async fn accept_payload(
        &self,
        participant_id: Uuid,
        payload: &str,
    ) -> Result<ClaimReceipt, AttendanceError> {
        let token = payload::decode_session_payload(payload)?;
        self.mark_attendance(participant_id, &token).await
    }

    /// Every claim on a session, oldest first. Owner only.
    pub async fn session_roster(
        &self,
        session_id: Uuid,
        presenter_id: Uuid,
    ) -> Result<Vec<AttendanceClaim>, AttendanceError> {
        let session = self.registry.get_session(session_id, presenter_id).await?;
        Ok(self.attendance_repo.list_by_session(session.id).await?)
    }

    /// A participant's claims, newest first.
    pub async fn participant_history(
        &self,
        participant_id: Uuid,
        pagination: Pagination,
    ) -> Result<PaginatedResult<AttendanceClaim>, AttendanceError> {
        Ok(self
            .attendance_repo
            .list_by_participant(participant_id, pagination)
            .await?)
    }

    pub async fn presenter_summary(
        &self,
        presenter_id: Uuid,
    ) -> Result<PresenterSummary, AttendanceError> {
        let midnight = self
            .registry
            .clock()
            .now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();

        let total_claims = self
            .attendance_repo
            .count_by_presenter(presenter_id, None)
            .await?;
        let claims_today = self
            .attendance_repo
            .count_by_presenter(presenter_id, Some(midnight))
            .await?;

        Ok(PresenterSummary {
            total_claims,
            claims_today,
        })
    }

    /// Claims recorded across all sessions.
    pub async fn total_claims(&self) -> Result<u64, AttendanceError> {
        Ok(self.attendance_repo.count_all().await?)
    }

    /// Latest claims across all sessions, capped by
    /// `recent_claims_limit`.
    pub async fn recent_claims(&self) -> Result<Vec<AttendanceClaim>, AttendanceError> {
        let limit = self.registry.config().recent_claims_limit;
        Ok(self.attendance_repo.list_recent(limit).await?)
    }
}
