//! Infrastructure layer for Clarimed.
//!
//! Contains implementations of the traits defined in `clarimed-core`:
//! SQLite storage with split read/write pools, the OpenAI-compatible
//! completion backend, the HTTP text-extraction client, and payment
//! signature verification.

pub mod config;
pub mod extract;
pub mod llm;
pub mod payment;
pub mod sqlite;
