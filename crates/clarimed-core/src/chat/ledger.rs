//! ChatLedger trait definition.
//!
//! The ledger is the single source of truth for conversation state and the
//! quota meter. Ordering within a session is insertion order: timestamp
//! first, insertion sequence as the tiebreaker, never content.

use clarimed_types::chat::{ChatMessage, SessionSummary};
use clarimed_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for the append-only chat ledger.
///
/// Implementations live in clarimed-infra (e.g., `SqliteChatLedger`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatLedger: Send + Sync {
    /// Append one message. The entry is immutable once written.
    fn append(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The trailing window of a session's history: the most recent `limit`
    /// messages, returned oldest first. Callers wanting deeper history must
    /// ask for it explicitly via a larger limit.
    fn history(
        &self,
        user_id: &Uuid,
        chat_id: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Number of user-role messages in a session. This is the quota meter;
    /// system and assistant entries never count. A session with no messages
    /// (including one that never existed) counts zero.
    fn count_user_questions(
        &self,
        user_id: &Uuid,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    /// Session summaries for a user, most recently active first.
    fn list_sessions(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;

    /// Remove every message of a session. Destructive and irreversible.
    /// Returns the number of messages removed.
    fn delete_session(
        &self,
        user_id: &Uuid,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
