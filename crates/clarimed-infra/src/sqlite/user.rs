//! SQLite user store implementation.
//!
//! Implements `UserStore` from `clarimed-core`. Identity upserts are keyed
//! by `external_id`: profile fields refresh on every login while the row
//! id, plan state, and created_at survive.

use clarimed_core::subscription::store::UserStore;
use clarimed_types::error::RepositoryError;
use clarimed_types::plan::PlanId;
use clarimed_types::user::{IdentityClaims, User};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `UserStore`.
pub struct SqliteUserStore {
    pool: DatabasePool,
}

impl SqliteUserStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_external_id(&self, external_id: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => UserRow::from_row(&row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_user(),
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Internal row type for mapping SQLite rows to domain User.
struct UserRow {
    id: String,
    external_id: String,
    display_name: String,
    picture_url: Option<String>,
    email: String,
    plan: String,
    plan_expires_at: Option<String>,
    created_at: String,
    last_active_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            display_name: row.try_get("display_name")?,
            picture_url: row.try_get("picture_url")?,
            email: row.try_get("email")?,
            plan: row.try_get("plan")?,
            plan_expires_at: row.try_get("plan_expires_at")?,
            created_at: row.try_get("created_at")?,
            last_active_at: row.try_get("last_active_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        let plan: PlanId = self
            .plan
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let plan_expires_at = self
            .plan_expires_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;
        let created_at = parse_datetime(&self.created_at)?;
        let last_active_at = parse_datetime(&self.last_active_at)?;

        Ok(User {
            id,
            external_id: self.external_id,
            display_name: self.display_name,
            picture_url: self.picture_url,
            email: self.email,
            plan,
            plan_expires_at,
            created_at,
            last_active_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl UserStore for SqliteUserStore {
    async fn upsert_identity(&self, claims: &IdentityClaims) -> Result<User, RepositoryError> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO users (id, external_id, display_name, picture_url, email, plan, plan_expires_at, created_at, last_active_at)
               VALUES (?, ?, ?, ?, ?, 'free', NULL, ?, ?)
               ON CONFLICT(external_id) DO UPDATE SET
                   display_name = excluded.display_name,
                   picture_url = excluded.picture_url,
                   email = excluded.email,
                   last_active_at = excluded.last_active_at"#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(&claims.external_user_id)
        .bind(&claims.display_name)
        .bind(&claims.picture_url)
        .bind(&claims.email)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        self.fetch_by_external_id(&claims.external_user_id).await
    }

    async fn get(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let user_row = UserRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }

    async fn set_plan(
        &self,
        user_id: &Uuid,
        plan: PlanId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET plan = ?, plan_expires_at = ? WHERE id = ?")
            .bind(plan.to_string())
            .bind(expires_at.as_ref().map(format_datetime))
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn touch_last_active(&self, user_id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_active_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
