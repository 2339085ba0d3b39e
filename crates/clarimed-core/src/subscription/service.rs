//! Subscription resolution and plan activation.
//!
//! `get_active_plan` is the only place expiry is interpreted: a lapsed
//! paid plan reads as free and is corrected in storage as a side effect.
//! There is no background sweep; correctness comes from this read path
//! being the sole input to quota decisions.

use chrono::{Duration, Utc};
use clarimed_types::billing::{ActivationOutcome, PaymentNotice, PlanActivation};
use clarimed_types::error::RepositoryError;
use clarimed_types::plan::{Plan, PlanCatalog, PlanId};
use tracing::{info, warn};
use uuid::Uuid;

use crate::subscription::store::{ActivationLog, RecordOutcome, UserStore};

/// Resolves active plans and applies verified payments.
///
/// Generic over `UserStore` and `ActivationLog` to maintain clean
/// architecture (clarimed-core never depends on clarimed-infra).
pub struct SubscriptionService<U: UserStore, A: ActivationLog> {
    users: U,
    activations: A,
    catalog: PlanCatalog,
}

impl<U: UserStore, A: ActivationLog> SubscriptionService<U, A> {
    pub fn new(users: U, activations: A, catalog: PlanCatalog) -> Self {
        Self {
            users,
            activations,
            catalog,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// The plan currently governing a user's quota.
    ///
    /// Unknown users resolve to the free plan without error. A paid plan
    /// whose expiry has passed also resolves to free, and the stored state
    /// is corrected in the same call (write-through, idempotent: a second
    /// read finds the user already on free and writes nothing).
    pub async fn get_active_plan(&self, user_id: &Uuid) -> Result<Plan, RepositoryError> {
        let Some(user) = self.users.get(user_id).await? else {
            return Ok(self.catalog.free().clone());
        };

        if !user.plan.is_free() {
            if let Some(expires_at) = user.plan_expires_at {
                if expires_at <= Utc::now() {
                    info!(%user_id, plan = %user.plan, %expires_at, "Plan lapsed, correcting to free");
                    self.users.set_plan(user_id, PlanId::Free, None).await?;
                    return Ok(self.catalog.free().clone());
                }
            }
        }

        Ok(self.catalog.get(user.plan).clone())
    }

    /// Apply a verified payment: record the audit entry, then set the plan.
    ///
    /// The audit insert goes first because its unique payment reference is
    /// the idempotency gate: a redelivered callback stops there and the
    /// user's plan is untouched. Expiry derives from the catalog duration
    /// at activation time.
    pub async fn activate(
        &self,
        user_id: &Uuid,
        plan_id: PlanId,
        notice: &PaymentNotice,
    ) -> Result<ActivationOutcome, RepositoryError> {
        let plan = self.catalog.get(plan_id);
        let activated_at = Utc::now();
        let expires_at = plan
            .duration_days
            .map(|days| activated_at + Duration::days(i64::from(days)));

        let activation = PlanActivation {
            id: Uuid::now_v7(),
            user_id: *user_id,
            plan: plan_id,
            payment_reference: notice.payment_reference.clone(),
            order_reference: notice.order_reference.clone(),
            amount_minor: notice.amount_minor,
            activated_at,
            expires_at,
        };

        match self.activations.record(&activation).await? {
            RecordOutcome::DuplicateReference => {
                warn!(
                    payment_reference = %notice.payment_reference,
                    "Duplicate payment callback ignored"
                );
                Ok(ActivationOutcome::AlreadyProcessed)
            }
            RecordOutcome::Recorded => {
                self.users.set_plan(user_id, plan_id, expires_at).await?;
                info!(%user_id, plan = %plan_id, ?expires_at, "Plan activated");
                Ok(ActivationOutcome::Activated(activation))
            }
        }
    }

    /// Activation history for support and audit views.
    pub async fn activation_history(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<PlanActivation>, RepositoryError> {
        self.activations.list_for_user(user_id).await
    }
}
