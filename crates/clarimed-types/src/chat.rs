//! Chat ledger types for Clarimed.
//!
//! A chat session has no record of its own: it is the set of messages
//! sharing a `(user_id, chat_id)` key, ordered by insertion. The ledger is
//! append-only; messages are immutable once written and removed only by
//! explicit session deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export MessageRole from llm (the ledger and the completion service
// share one role vocabulary).
pub use crate::llm::MessageRole;

/// A single entry in the chat ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Opaque session key, unique per user. Generated server-side when the
    /// caller omits it; carries no chronological meaning.
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    /// Weak back-reference to the report this entry concerns. May dangle
    /// after report deletion; resolved to "report unavailable" on lookup.
    pub report_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a new ledger entry with a fresh id and the current timestamp.
    pub fn new(
        user_id: Uuid,
        chat_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
        report_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            chat_id: chat_id.into(),
            role,
            content: content.into(),
            report_id,
            created_at: Utc::now(),
        }
    }
}

/// One chat session as shown in a session list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub chat_id: String,
    /// Derived from the first user message, or "New Chat" when none exists.
    pub title: String,
    pub message_count: u32,
    pub last_activity_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_serde_roundtrip() {
        let msg = ChatMessage {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            chat_id: "c1".to_string(),
            role: MessageRole::User,
            content: "What does hemoglobin 9.2 mean?".to_string(),
            report_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.chat_id, "c1");
        assert_eq!(parsed.role, MessageRole::User);
    }

    #[test]
    fn test_message_role_reexport() {
        // chat::MessageRole and llm::MessageRole are the same type
        let role: MessageRole = crate::llm::MessageRole::Assistant;
        assert_eq!(role.to_string(), "assistant");
    }

    #[test]
    fn test_chat_message_new_assigns_identity() {
        let user_id = Uuid::now_v7();
        let msg = ChatMessage::new(user_id, "c9", MessageRole::System, "Report uploaded", None);
        assert_eq!(msg.user_id, user_id);
        assert_eq!(msg.chat_id, "c9");
        assert!(msg.report_id.is_none());
        assert!(!msg.id.is_nil());
    }
}
