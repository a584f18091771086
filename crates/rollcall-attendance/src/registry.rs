//! Session token issuance, resolution, and session lifecycle.

use chrono::Duration;
use rollcall_core::clock::Clock;
use rollcall_core::error::RollcallError;
use rollcall_core::models::session::{CreateSession, EndReason, Session};
use rollcall_core::repository::{PaginatedResult, Pagination, SessionRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AttendanceConfig;
use crate::error::AttendanceError;
use crate::token;

/// Owns presentation sessions and the tokens that identify them.
///
/// Generic over the repository and clock so the registry has no
/// dependency on the database crate and expiry can be tested without
/// waiting.
pub struct SessionRegistry<S: SessionRepository, C: Clock> {
    session_repo: S,
    clock: C,
    config: AttendanceConfig,
}

impl<S: SessionRepository, C: Clock> SessionRegistry<S, C> {
    pub fn new(session_repo: S, clock: C, config: AttendanceConfig) -> Self {
        Self {
            session_repo,
            clock,
            config,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    /// Open a new session for `presenter_id` lasting `duration_secs`.
    ///
    /// The token is drawn from a CSPRNG and inserted through the store's
    /// unique token index; a collision regenerates it.
    pub async fn create_session(
        &self,
        presenter_id: Uuid,
        label: &str,
        duration_secs: u64,
    ) -> Result<Session, AttendanceError> {
        // 1. Validate input.
        let label = label.trim();
        if label.is_empty() {
            return Err(AttendanceError::InvalidInput(
                "session label must not be empty".into(),
            ));
        }
        if duration_secs == 0 {
            return Err(AttendanceError::InvalidInput(
                "session duration must be positive".into(),
            ));
        }
        if let Some(max) = self
            .config
            .max_session_duration_secs
            .filter(|max| duration_secs > *max)
        {
            return Err(AttendanceError::InvalidInput(format!(
                "session duration exceeds {max} seconds"
            )));
        }

        // 2. Fix the validity window.
        let created_at = self.clock.now();
        let expires_at = i64::try_from(duration_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|d| created_at.checked_add_signed(d))
            .ok_or_else(|| {
                AttendanceError::InvalidInput("session duration out of range".into())
            })?;

        // 3. Issue a token, regenerating on collision.
        let attempts = self.config.max_token_attempts.max(1);
        for attempt in 1..=attempts {
            let token = token::generate_session_token(self.config.effective_token_bytes());
            let input = CreateSession {
                presenter_id,
                label: label.to_string(),
                token,
                created_at,
                expires_at,
            };

            match self.session_repo.create(input).await {
                Ok(session) => {
                    info!(
                        session_id = %session.id,
                        presenter_id = %presenter_id,
                        duration_secs,
                        "Session created"
                    );
                    return Ok(session);
                }
                Err(RollcallError::AlreadyExists { .. }) => {
                    warn!(attempt, "Session token collided, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RollcallError::Internal(format!(
            "could not issue a unique session token after {attempts} attempts"
        ))
        .into())
    }

    /// Resolve a token to a session that currently accepts claims.
    ///
    /// Distinguishes an unknown token, a session closed by its presenter,
    /// and a session whose window has passed.
    pub async fn resolve_token(&self, token: &str) -> Result<Session, AttendanceError> {
        let session = match self.session_repo.get_by_token(token).await {
            Ok(session) => session,
            Err(RollcallError::NotFound { .. }) => {
                debug!("Token did not match any session");
                return Err(AttendanceError::TokenNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !session.active {
            debug!(session_id = %session.id, "Token resolved to an inactive session");
            // The sweep closes lapsed sessions for bookkeeping only; they
            // still report as expired.
            return Err(match session.end_reason {
                Some(EndReason::Expired) => AttendanceError::SessionExpired,
                _ => AttendanceError::SessionInactive,
            });
        }

        if session.is_expired_at(self.clock.now()) {
            debug!(session_id = %session.id, "Token resolved to an expired session");
            return Err(AttendanceError::SessionExpired);
        }

        Ok(session)
    }

    /// End a session early. Only the owning presenter may do this; a
    /// deactivated session can never accept claims again.
    ///
    /// Deactivating a session that is already inactive succeeds without
    /// changing it.
    pub async fn deactivate(
        &self,
        session_id: Uuid,
        presenter_id: Uuid,
    ) -> Result<(), AttendanceError> {
        let session = self.get_session(session_id, presenter_id).await?;

        let ended = self
            .session_repo
            .end(session.id, EndReason::Deactivated, self.clock.now())
            .await?;

        if ended {
            info!(session_id = %session.id, presenter_id = %presenter_id, "Session deactivated");
        } else {
            debug!(session_id = %session.id, "Session was already inactive");
        }

        Ok(())
    }

    /// Fetch a session on behalf of its owner.
    pub async fn get_session(
        &self,
        session_id: Uuid,
        presenter_id: Uuid,
    ) -> Result<Session, AttendanceError> {
        let session = self
            .session_repo
            .get_by_id(session_id)
            .await
            .map_err(|e| match e {
                RollcallError::NotFound { .. } => AttendanceError::SessionNotFound,
                other => other.into(),
            })?;

        if session.presenter_id != presenter_id {
            return Err(AttendanceError::NotOwner);
        }

        Ok(session)
    }

    /// A presenter's sessions, newest first.
    pub async fn list_sessions(
        &self,
        presenter_id: Uuid,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Session>, AttendanceError> {
        Ok(self
            .session_repo
            .list_by_presenter(presenter_id, pagination)
            .await?)
    }

    /// Mark lapsed sessions inactive. Claim arbitration does not depend on
    /// this; it keeps the stored `active` flag honest for reporting.
    pub async fn sweep_expired(&self) -> Result<u64, AttendanceError> {
        let ended = self.session_repo.end_expired(self.clock.now()).await?;
        if ended > 0 {
            info!(ended, "Closed expired sessions");
        }
        Ok(ended)
    }
}
