//! Database-specific error types and conversions.

use rollcall_core::error::RollcallError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A unique index or record id rejected the write.
    #[error("Uniqueness conflict on {entity}")]
    Conflict { entity: String },

    /// The engine aborted the transaction because a concurrent one
    /// touched the same keys. Safe to re-run the statement.
    #[error("Transaction conflict: {0}")]
    Retryable(String),
}

impl DbError {
    /// Classify an error reported for a write statement on `entity`.
    ///
    /// SurrealDB reports unique-index and duplicate-record violations as
    /// plain errors, so the message text is the only stable signal.
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if is_uniqueness_violation(&msg) {
            DbError::Conflict {
                entity: entity.to_string(),
            }
        } else if is_retryable(&msg) {
            DbError::Retryable(msg)
        } else {
            DbError::Query(msg)
        }
    }
}

fn is_uniqueness_violation(msg: &str) -> bool {
    msg.contains("already contains") || msg.contains("already exists")
}

fn is_retryable(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    lower.contains("can be retried") || lower.contains("transaction conflict")
}

impl From<DbError> for RollcallError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RollcallError::NotFound { entity, id },
            DbError::Conflict { entity } => RollcallError::AlreadyExists { entity },
            other => RollcallError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_messages_are_conflicts() {
        assert!(is_uniqueness_violation(
            "Database index `idx_attendance_claim` already contains ['a', 'b'], \
             with record `attendance:x`"
        ));
        assert!(is_uniqueness_violation(
            "Database record `session:abc` already exists"
        ));
        assert!(!is_uniqueness_violation("Parse error"));
    }

    #[test]
    fn commit_conflicts_are_retryable() {
        assert!(is_retryable(
            "Failed to commit transaction due to a read or write conflict. \
             This transaction can be retried"
        ));
        assert!(!is_retryable("Database record `session:abc` already exists"));
    }

    #[test]
    fn conflict_maps_to_already_exists() {
        let err: RollcallError = DbError::Conflict {
            entity: "attendance".into(),
        }
        .into();
        assert!(matches!(err, RollcallError::AlreadyExists { entity } if entity == "attendance"));
    }

    #[test]
    fn not_found_is_preserved() {
        let err: RollcallError = DbError::NotFound {
            entity: "session".into(),
            id: "42".into(),
        }
        .into();
        assert!(matches!(err, RollcallError::NotFound { .. }));
    }
}
