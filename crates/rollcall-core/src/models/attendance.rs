//! Attendance claim domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded assertion that a participant was present for a session.
///
/// At most one claim exists per `(participant_id, session_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceClaim {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub session_id: Uuid,
    /// Copied from the session at claim time for reporting.
    pub presenter_id: Uuid,
    /// Copied from the session at claim time for display only.
    pub session_label: String,
    /// Token value used for the claim, kept for audit.
    pub source_token: String,
    pub claimed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceClaim {
    pub participant_id: Uuid,
    pub session_id: Uuid,
    pub presenter_id: Uuid,
    pub session_label: String,
    pub source_token: String,
    pub claimed_at: DateTime<Utc>,
}
