//! Per-chat question quota enforcement.
//!
//! One gate serves every entry point. The check reads the active plan and
//! the session's user-question count; it does not lock against concurrent
//! requests on the same session, so admission can transiently exceed the
//! allowance by the number of in-flight requests. That bounded race is
//! accepted; a denial is a business outcome, not a fault.

use clarimed_types::error::RepositoryError;
use clarimed_types::plan::Plan;
use tracing::debug;
use uuid::Uuid;

use crate::chat::ledger::ChatLedger;
use crate::subscription::service::SubscriptionService;
use crate::subscription::store::{ActivationLog, UserStore};

/// Outcome of a quota check.
///
/// Carries everything a caller needs to render an upgrade prompt on
/// denial: the governing plan, the consumed count, and (via the plan)
/// the limit.
#[derive(Debug, Clone)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub plan: Plan,
    pub used: u32,
}

impl QuotaDecision {
    /// The finite allowance, or `None` for unlimited plans.
    pub fn limit(&self) -> Option<u32> {
        self.plan.questions_per_chat.limit()
    }
}

/// Decides whether a session may accept another user question.
pub struct QuotaGate<U: UserStore, A: ActivationLog, L: ChatLedger> {
    subscriptions: SubscriptionService<U, A>,
    ledger: L,
}

impl<U: UserStore, A: ActivationLog, L: ChatLedger> QuotaGate<U, A, L> {
    pub fn new(subscriptions: SubscriptionService<U, A>, ledger: L) -> Self {
        Self {
            subscriptions,
            ledger,
        }
    }

    pub fn subscriptions(&self) -> &SubscriptionService<U, A> {
        &self.subscriptions
    }

    /// Whether the next question on this session may proceed.
    ///
    /// Allows strictly while `used < allowance`; the unlimited sentinel
    /// always allows. Unknown users are governed by the free plan.
    pub async fn can_ask(
        &self,
        user_id: &Uuid,
        chat_id: &str,
    ) -> Result<QuotaDecision, RepositoryError> {
        let plan = self.subscriptions.get_active_plan(user_id).await?;
        let used = self.ledger.count_user_questions(user_id, chat_id).await?;
        let allowed = plan.questions_per_chat.permits(used);

        if !allowed {
            debug!(
                %user_id,
                chat_id,
                plan = %plan.id,
                used,
                limit = ?plan.questions_per_chat.limit(),
                "Question quota reached"
            );
        }

        Ok(QuotaDecision {
            allowed,
            plan,
            used,
        })
    }
}
