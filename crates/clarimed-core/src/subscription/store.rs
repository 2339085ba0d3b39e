//! Storage traits for users and the payment activation audit log.

use chrono::{DateTime, Utc};
use clarimed_types::billing::PlanActivation;
use clarimed_types::error::RepositoryError;
use clarimed_types::plan::PlanId;
use clarimed_types::user::{IdentityClaims, User};
use uuid::Uuid;

/// Repository trait for user identity and subscription state.
///
/// Implementations live in clarimed-infra (e.g., `SqliteUserStore`).
pub trait UserStore: Send + Sync {
    /// Insert a user on first login or refresh the profile fields of an
    /// existing one, keyed by the external identity. New users start on
    /// the free plan.
    fn upsert_identity(
        &self,
        claims: &IdentityClaims,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Set plan and expiry in one statement. Both columns change together
    /// or not at all; no partially-updated state is ever visible.
    fn set_plan(
        &self,
        user_id: &Uuid,
        plan: PlanId,
        expires_at: Option<DateTime<Utc>>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Best-effort activity timestamp refresh.
    fn touch_last_active(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Result of recording a payment activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The payment reference already exists; the earlier record stands.
    DuplicateReference,
}

/// Repository trait for the append-only activation audit log.
///
/// The storage layer enforces payment-reference uniqueness; callers rely
/// on [`RecordOutcome::DuplicateReference`] instead of check-then-act.
pub trait ActivationLog: Send + Sync {
    fn record(
        &self,
        activation: &PlanActivation,
    ) -> impl std::future::Future<Output = Result<RecordOutcome, RepositoryError>> + Send;

    /// Activation history for one user, most recent first.
    fn list_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<PlanActivation>, RepositoryError>> + Send;
}
