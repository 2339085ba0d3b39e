//! Payment activation types.
//!
//! `PlanActivation` is the append-only audit trail of completed payments.
//! Quota decisions never read it; they read `User.plan` directly. Its one
//! operational duty is duplicate detection via the unique payment reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::PlanId;

/// Append-only audit record of a completed payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanActivation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: PlanId,
    /// External payment reference; unique across all activations.
    pub payment_reference: String,
    pub order_reference: String,
    pub amount_minor: i64,
    pub activated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A payment-gateway callback after signature verification succeeded.
#[derive(Debug, Clone)]
pub struct PaymentNotice {
    pub order_reference: String,
    pub payment_reference: String,
    pub amount_minor: i64,
}

/// Result of applying a payment notice.
///
/// A duplicate payment reference is a normal outcome (gateways redeliver),
/// not an error: the earlier activation stands untouched.
#[derive(Debug, Clone)]
pub enum ActivationOutcome {
    Activated(PlanActivation),
    AlreadyProcessed,
}

impl ActivationOutcome {
    pub fn is_activated(&self) -> bool {
        matches!(self, ActivationOutcome::Activated(_))
    }
}
