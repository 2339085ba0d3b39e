//! SQLite chat ledger implementation.
//!
//! Implements `ChatLedger` from `clarimed-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, RFC 3339 timestamp
//! strings. Ordering within a session is `(created_at, seq)`; `seq` is the
//! autoincrement insertion sequence and breaks timestamp ties.

use clarimed_core::chat::ledger::ChatLedger;
use clarimed_core::chat::service::derive_title;
use clarimed_types::chat::{ChatMessage, MessageRole, SessionSummary};
use clarimed_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::HashMap;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatLedger`.
pub struct SqliteChatLedger {
    pool: DatabasePool,
}

impl SqliteChatLedger {
    /// Create a new ledger backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    user_id: String,
    chat_id: String,
    role: String,
    content: String,
    report_id: Option<String>,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            chat_id: row.try_get("chat_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            report_id: row.try_get("report_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let report_id = self
            .report_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid report_id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(ChatMessage {
            id,
            user_id,
            chat_id: self.chat_id,
            role,
            content: self.content,
            report_id,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ChatLedger implementation
// ---------------------------------------------------------------------------

impl ChatLedger for SqliteChatLedger {
    async fn append(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_messages (id, user_id, chat_id, role, content, report_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.user_id.to_string())
        .bind(&message.chat_id)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(message.report_id.map(|id| id.to_string()))
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn history(
        &self,
        user_id: &Uuid,
        chat_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        // Newest-first LIMIT picks the trailing window; the reverse below
        // restores chronological order for the caller.
        let rows = sqlx::query(
            r#"SELECT id, user_id, chat_id, role, content, report_id, created_at
               FROM chat_messages
               WHERE user_id = ? AND chat_id = ?
               ORDER BY created_at DESC, seq DESC
               LIMIT ?"#,
        )
        .bind(user_id.to_string())
        .bind(chat_id)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }
        messages.reverse();

        Ok(messages)
    }

    async fn count_user_questions(
        &self,
        user_id: &Uuid,
        chat_id: &str,
    ) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as cnt FROM chat_messages WHERE user_id = ? AND chat_id = ? AND role = 'user'",
        )
        .bind(user_id.to_string())
        .bind(chat_id)
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u32)
    }

    async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT chat_id, COUNT(*) as message_count, MAX(created_at) as last_activity_at
               FROM chat_messages
               WHERE user_id = ?
               GROUP BY chat_id
               ORDER BY last_activity_at DESC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // SQLite's bare-column-with-MIN picks the content of the earliest
        // user message per chat, which seeds the title.
        let title_rows = sqlx::query(
            r#"SELECT chat_id, content, MIN(seq) as first_seq
               FROM chat_messages
               WHERE user_id = ? AND role = 'user'
               GROUP BY chat_id"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut first_questions: HashMap<String, String> = HashMap::with_capacity(title_rows.len());
        for row in &title_rows {
            let chat_id: String = row
                .try_get("chat_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let content: String = row
                .try_get("content")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            first_questions.insert(chat_id, content);
        }

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_id: String = row
                .try_get("chat_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let message_count: i64 = row
                .try_get("message_count")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let last_activity_at: String = row
                .try_get("last_activity_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            let title = derive_title(first_questions.get(&chat_id).map(|s| s.as_str()));
            summaries.push(SessionSummary {
                title,
                message_count: message_count as u32,
                last_activity_at: parse_datetime(&last_activity_at)?,
                chat_id,
            });
        }

        Ok(summaries)
    }

    async fn delete_session(&self, user_id: &Uuid, chat_id: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE user_id = ? AND chat_id = ?")
            .bind(user_id.to_string())
            .bind(chat_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
