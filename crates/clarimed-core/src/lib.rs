//! Business logic for Clarimed.
//!
//! This crate holds the quota-aware session manager: token budgeting,
//! the chat ledger and subscription contracts, the quota gate, context
//! assembly, and the session orchestrator that ties them together.
//!
//! Storage and network implementations live in clarimed-infra; this crate
//! defines the traits they implement and never touches I/O itself.

pub mod budget;
pub mod chat;
pub mod context;
pub mod extract;
pub mod llm;
pub mod quota;
pub mod report;
pub mod session;
pub mod subscription;
