//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use rollcall_core::error::RollcallResult;
use rollcall_core::models::session::{CreateSession, EndReason, Session};
use rollcall_core::repository::{PaginatedResult, Pagination, SessionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    presenter_id: String,
    label: String,
    token: String,
    active: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    end_reason: Option<String>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    presenter_id: String,
    label: String,
    token: String,
    active: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    end_reason: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_end_reason(s: Option<&str>) -> Result<Option<EndReason>, DbError> {
    match s {
        None => Ok(None),
        Some("Deactivated") => Ok(Some(EndReason::Deactivated)),
        Some("Expired") => Ok(Some(EndReason::Expired)),
        Some(other) => Err(DbError::Migration(format!("unknown end reason: {other}"))),
    }
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<Session, DbError> {
        let presenter_id = Uuid::parse_str(&self.presenter_id)
            .map_err(|e| DbError::Migration(format!("invalid presenter UUID: {e}")))?;
        Ok(Session {
            id,
            presenter_id,
            label: self.label,
            token: self.token,
            active: self.active,
            created_at: self.created_at,
            expires_at: self.expires_at,
            ended_at: self.ended_at,
            end_reason: parse_end_reason(self.end_reason.as_deref())?,
        })
    }
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        SessionRow {
            presenter_id: self.presenter_id,
            label: self.label,
            token: self.token,
            active: self.active,
            created_at: self.created_at,
            expires_at: self.expires_at,
            ended_at: self.ended_at,
            end_reason: self.end_reason,
        }
        .into_session(id)
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> RollcallResult<Session> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 presenter_id = $presenter_id, \
                 label = $label, \
                 token = $session_token, \
                 active = true, \
                 created_at = $created_at, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("presenter_id", input.presenter_id.to_string()))
            .bind(("label", input.label))
            .bind(("session_token", input.token))
            .bind(("created_at", input.created_at))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(|e| DbError::from_write("session", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("session", e))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row.into_session(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> RollcallResult<Session> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        row.into_session(id).map_err(Into::into)
    }

    async fn get_by_token(&self, token: &str) -> RollcallResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token = $session_token",
            )
            .bind(("session_token", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        // The token itself is a bearer secret; keep it out of error text.
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "token".into(),
        })?;

        row.try_into_session().map_err(Into::into)
    }

    async fn list_by_presenter(
        &self,
        presenter_id: Uuid,
        pagination: Pagination,
    ) -> RollcallResult<PaginatedResult<Session>> {
        let presenter_str = presenter_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM session \
                 WHERE presenter_id = $presenter_id GROUP ALL",
            )
            .bind(("presenter_id", presenter_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE presenter_id = $presenter_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("presenter_id", presenter_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_session())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn end(&self, id: Uuid, reason: EndReason, at: DateTime<Utc>) -> RollcallResult<bool> {
        let result = self
            .db
            .query(
                "UPDATE type::record('session', $id) SET \
                 active = false, \
                 ended_at = $at, \
                 end_reason = $reason \
                 WHERE active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("at", at))
            .bind(("reason", reason.as_str()))
            .await
            .map_err(|e| DbError::from_write("session", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("session", e))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn end_expired(&self, now: DateTime<Utc>) -> RollcallResult<u64> {
        let result = self
            .db
            .query(
                "UPDATE session SET \
                 active = false, \
                 ended_at = $now, \
                 end_reason = $reason \
                 WHERE active = true AND expires_at <= $now",
            )
            .bind(("now", now))
            .bind(("reason", EndReason::Expired.as_str()))
            .await
            .map_err(|e| DbError::from_write("session", e))?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("session", e))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
