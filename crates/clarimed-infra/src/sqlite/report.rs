//! SQLite report store implementation.

use clarimed_core::report::ReportStore;
use clarimed_types::error::RepositoryError;
use clarimed_types::report::Report;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ReportStore`.
pub struct SqliteReportStore {
    pool: DatabasePool,
}

impl SqliteReportStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ReportRow {
    id: String,
    user_id: String,
    filename: String,
    content: String,
    uploaded_at: String,
}

impl ReportRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            filename: row.try_get("filename")?,
            content: row.try_get("content")?,
            uploaded_at: row.try_get("uploaded_at")?,
        })
    }

    fn into_report(self) -> Result<Report, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid report id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let uploaded_at = DateTime::parse_from_rfc3339(&self.uploaded_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))?;

        Ok(Report {
            id,
            user_id,
            filename: self.filename,
            content: self.content,
            uploaded_at,
        })
    }
}

impl ReportStore for SqliteReportStore {
    async fn save(&self, report: &Report) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO reports (id, user_id, filename, content, uploaded_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(report.id.to_string())
        .bind(report.user_id.to_string())
        .bind(&report.filename)
        .bind(&report.content)
        .bind(report.uploaded_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(
        &self,
        user_id: &Uuid,
        report_id: &Uuid,
    ) -> Result<Option<Report>, RepositoryError> {
        // Ownership is part of the key: someone else's report reads as absent.
        let row = sqlx::query("SELECT * FROM reports WHERE id = ? AND user_id = ?")
            .bind(report_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let report_row = ReportRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(report_row.into_report()?))
            }
            None => Ok(None),
        }
    }
}
