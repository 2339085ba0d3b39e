//! Order reference encoding for payment callbacks.
//!
//! An order reference is minted when a checkout starts and travels through
//! the gateway unchanged, so the callback can be resolved to a user and a
//! plan without any server-side order table. Format:
//! `<order_id>:<user_id>:<plan_id>` with both ids as UUIDs.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use clarimed_types::error::PaymentError;

/// A parsed order reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReference {
    /// Unique id for this checkout attempt.
    pub order_id: Uuid,
    /// The purchasing user.
    pub user_id: Uuid,
    /// Catalog plan id (e.g. "starter", "pro").
    pub plan_id: String,
}

impl OrderReference {
    /// Mint a fresh order reference for a checkout.
    pub fn new(user_id: Uuid, plan_id: impl Into<String>) -> Self {
        Self {
            order_id: Uuid::now_v7(),
            user_id,
            plan_id: plan_id.into(),
        }
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.order_id, self.user_id, self.plan_id)
    }
}

impl FromStr for OrderReference {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(PaymentError::Malformed(format!(
                "order reference must have 3 segments, got {}",
                parts.len()
            )));
        }

        let order_id = Uuid::parse_str(parts[0])
            .map_err(|e| PaymentError::Malformed(format!("bad order id: {e}")))?;
        let user_id = Uuid::parse_str(parts[1])
            .map_err(|e| PaymentError::Malformed(format!("bad user id: {e}")))?;

        let plan_id = parts[2];
        if plan_id.is_empty() {
            return Err(PaymentError::Malformed("empty plan id".to_string()));
        }

        Ok(Self {
            order_id,
            user_id,
            plan_id: plan_id.to_string(),
        })
    }
}
