//! Completion backend abstraction.
//!
//! The orchestrator talks to a single non-streaming chat-completion
//! backend through `CompletionBackend`; the concrete HTTP client lives
//! in clarimed-infra.

pub mod provider;

pub use provider::CompletionBackend;
