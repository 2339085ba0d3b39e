//! Subscription state: user plans, lazy expiry, payment activation.

pub mod service;
pub mod store;

pub use service::SubscriptionService;
pub use store::{ActivationLog, RecordOutcome, UserStore};
