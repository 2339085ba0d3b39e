//! HTTP request handlers for the REST API.

pub mod auth;
pub mod billing;
pub mod chat;
pub mod report;
pub mod session;
