//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. The at-most-once guarantees of the
//! attendance core live here as UNIQUE indexes.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Presentation sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD presenter_id ON TABLE session TYPE string;
DEFINE FIELD label ON TABLE session TYPE string;
DEFINE FIELD token ON TABLE session TYPE string;
DEFINE FIELD active ON TABLE session TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE session TYPE datetime;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD ended_at ON TABLE session TYPE option<datetime>;
DEFINE FIELD end_reason ON TABLE session TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['Deactivated', 'Expired'];
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS token UNIQUE;
DEFINE INDEX idx_session_presenter ON TABLE session \
    COLUMNS presenter_id, created_at;
DEFINE INDEX idx_session_active_expiry ON TABLE session \
    COLUMNS active, expires_at;

-- =======================================================================
-- Attendance claims (append-only)
-- =======================================================================
DEFINE TABLE attendance SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD participant_id ON TABLE attendance TYPE string;
DEFINE FIELD session_id ON TABLE attendance TYPE string;
DEFINE FIELD presenter_id ON TABLE attendance TYPE string;
DEFINE FIELD session_label ON TABLE attendance TYPE string;
DEFINE FIELD source_token ON TABLE attendance TYPE string;
DEFINE FIELD claimed_at ON TABLE attendance TYPE datetime;
DEFINE INDEX idx_attendance_claim ON TABLE attendance \
    COLUMNS participant_id, session_id UNIQUE;
DEFINE INDEX idx_attendance_session ON TABLE attendance \
    COLUMNS session_id;
DEFINE INDEX idx_attendance_presenter ON TABLE attendance \
    COLUMNS presenter_id, claimed_at;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
