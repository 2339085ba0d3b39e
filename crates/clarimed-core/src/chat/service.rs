//! Session listing and history access over the chat ledger.
//!
//! Thin service wrapping [`ChatLedger`] for the read/delete paths the API
//! exposes directly. Also owns session title derivation, shared with the
//! ledger implementations.

use clarimed_types::chat::{ChatMessage, SessionSummary};
use clarimed_types::error::RepositoryError;
use tracing::info;
use uuid::Uuid;

use crate::chat::ledger::ChatLedger;

/// History window returned when the caller does not specify a limit.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;

/// Maximum characters of a derived session title before truncation.
pub const TITLE_MAX_CHARS: usize = 50;

/// Title shown for sessions with no user message yet.
pub const UNTITLED_SESSION: &str = "New Chat";

/// Derive a session title from its first user message.
///
/// Whitespace runs collapse to single spaces so multi-line questions read
/// as one line; titles longer than [`TITLE_MAX_CHARS`] are truncated with
/// a trailing ellipsis marker.
pub fn derive_title(first_user_message: Option<&str>) -> String {
    let Some(message) = first_user_message else {
        return UNTITLED_SESSION.to_string();
    };
    let flattened = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.is_empty() {
        return UNTITLED_SESSION.to_string();
    }
    if flattened.chars().count() <= TITLE_MAX_CHARS {
        return flattened;
    }
    let truncated: String = flattened.chars().take(TITLE_MAX_CHARS).collect();
    format!("{truncated}...")
}

/// Read/delete access to chat sessions.
///
/// Generic over `ChatLedger` so clarimed-core never depends on
/// clarimed-infra.
pub struct ChatLedgerService<L: ChatLedger> {
    ledger: L,
}

impl<L: ChatLedger> ChatLedgerService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Session summaries for a user, most recently active first.
    pub async fn list_sessions(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<SessionSummary>, RepositoryError> {
        self.ledger.list_sessions(user_id).await
    }

    /// The trailing `limit` messages of a session, oldest first.
    ///
    /// `limit` falls back to [`DEFAULT_HISTORY_LIMIT`] when absent.
    pub async fn history(
        &self,
        user_id: &Uuid,
        chat_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        self.ledger.history(user_id, chat_id, limit).await
    }

    /// Hard-delete a session. Deleting a session that never existed is a
    /// no-op reporting zero removed messages.
    pub async fn delete_session(
        &self,
        user_id: &Uuid,
        chat_id: &str,
    ) -> Result<u64, RepositoryError> {
        let removed = self.ledger.delete_session(user_id, chat_id).await?;
        info!(%user_id, chat_id, removed, "Chat session deleted");
        Ok(removed)
    }
}
