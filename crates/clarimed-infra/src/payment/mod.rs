//! Payment gateway integration.
//!
//! The gateway itself is external; this module proves a callback really
//! came from it (HMAC-SHA256 signature over the references) and decodes
//! the order reference into user and plan identity.

pub mod order;
pub mod signature;

pub use order::OrderReference;
pub use signature::{compute_callback_signature, verify_callback_signature};
