//! Shared domain types for Clarimed.
//!
//! This crate contains the core domain types used across the Clarimed platform:
//! users, plans, chat messages, reports, billing records, and their associated
//! error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod billing;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod plan;
pub mod report;
pub mod user;
