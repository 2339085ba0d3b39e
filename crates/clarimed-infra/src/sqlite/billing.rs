//! SQLite activation log implementation.
//!
//! The UNIQUE constraint on `payment_reference` is the idempotency guard
//! for redelivered gateway callbacks; a violation surfaces as
//! `RecordOutcome::DuplicateReference`, never as an error.

use clarimed_core::subscription::store::{ActivationLog, RecordOutcome};
use clarimed_types::billing::PlanActivation;
use clarimed_types::error::RepositoryError;
use clarimed_types::plan::PlanId;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ActivationLog`.
pub struct SqliteActivationLog {
    pool: DatabasePool,
}

impl SqliteActivationLog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ActivationRow {
    id: String,
    user_id: String,
    plan: String,
    payment_reference: String,
    order_reference: String,
    amount_minor: i64,
    activated_at: String,
    expires_at: Option<String>,
}

impl ActivationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            plan: row.try_get("plan")?,
            payment_reference: row.try_get("payment_reference")?,
            order_reference: row.try_get("order_reference")?,
            amount_minor: row.try_get("amount_minor")?,
            activated_at: row.try_get("activated_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn into_activation(self) -> Result<PlanActivation, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid activation id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let plan: PlanId = self
            .plan
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let activated_at = parse_datetime(&self.activated_at)?;
        let expires_at = self.expires_at.as_deref().map(parse_datetime).transpose()?;

        Ok(PlanActivation {
            id,
            user_id,
            plan,
            payment_reference: self.payment_reference,
            order_reference: self.order_reference,
            amount_minor: self.amount_minor,
            activated_at,
            expires_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

impl ActivationLog for SqliteActivationLog {
    async fn record(&self, activation: &PlanActivation) -> Result<RecordOutcome, RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO plan_activations (id, user_id, plan, payment_reference, order_reference, amount_minor, activated_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(activation.id.to_string())
        .bind(activation.user_id.to_string())
        .bind(activation.plan.to_string())
        .bind(&activation.payment_reference)
        .bind(&activation.order_reference)
        .bind(activation.amount_minor)
        .bind(activation.activated_at.to_rfc3339())
        .bind(activation.expires_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(RecordOutcome::Recorded),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Ok(RecordOutcome::DuplicateReference)
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<PlanActivation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM plan_activations WHERE user_id = ? ORDER BY activated_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut activations = Vec::with_capacity(rows.len());
        for row in &rows {
            let activation_row = ActivationRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            activations.push(activation_row.into_activation()?);
        }

        Ok(activations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn seed_user(pool: &DatabasePool) -> Uuid {
        let user_id = Uuid::now_v7();
        sqlx::query(
            r#"INSERT INTO users (id, external_id, display_name, email, plan, created_at, last_active_at)
               VALUES (?, ?, 'Test', 'test@example.com', 'free', ?, ?)"#,
        )
        .bind(user_id.to_string())
        .bind(format!("ext-{user_id}"))
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
        user_id
    }

    fn make_activation(user_id: Uuid, payment_reference: &str) -> PlanActivation {
        PlanActivation {
            id: Uuid::now_v7(),
            user_id,
            plan: PlanId::Pro,
            payment_reference: payment_reference.to_string(),
            order_reference: format!("{}:{}:pro", Uuid::now_v7(), user_id),
            amount_minor: 29_900,
            activated_at: Utc::now(),
            expires_at: Some(Utc::now() + chrono::Duration::days(30)),
        }
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let pool = test_pool().await;
        let log = SqliteActivationLog::new(pool.clone());
        let user_id = seed_user(&pool).await;

        let outcome = log.record(&make_activation(user_id, "pay_1")).await.unwrap();
        assert_eq!(outcome, RecordOutcome::Recorded);

        let history = log.list_for_user(&user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].payment_reference, "pay_1");
        assert_eq!(history[0].plan, PlanId::Pro);
        assert_eq!(history[0].amount_minor, 29_900);
    }

    #[tokio::test]
    async fn test_duplicate_payment_reference_is_reported_not_recorded() {
        let pool = test_pool().await;
        let log = SqliteActivationLog::new(pool.clone());
        let user_id = seed_user(&pool).await;

        log.record(&make_activation(user_id, "pay_dup")).await.unwrap();
        // Redelivery carries a fresh row id but the same payment reference.
        let outcome = log.record(&make_activation(user_id, "pay_dup")).await.unwrap();
        assert_eq!(outcome, RecordOutcome::DuplicateReference);

        let history = log.list_for_user(&user_id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let pool = test_pool().await;
        let log = SqliteActivationLog::new(pool.clone());
        let user_id = seed_user(&pool).await;

        let mut first = make_activation(user_id, "pay_a");
        first.activated_at = Utc::now() - chrono::Duration::days(40);
        log.record(&first).await.unwrap();
        log.record(&make_activation(user_id, "pay_b")).await.unwrap();

        let history = log.list_for_user(&user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].payment_reference, "pay_b");
        assert_eq!(history[1].payment_reference, "pay_a");
    }
}
