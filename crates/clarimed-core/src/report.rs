//! Report persistence boundary.

use clarimed_types::error::RepositoryError;
use clarimed_types::report::Report;
use uuid::Uuid;

/// Storage for extracted report text.
///
/// Lookups are scoped to the owning user; a report id that exists but
/// belongs to someone else reads as absent.
pub trait ReportStore: Send + Sync {
    fn save(
        &self,
        report: &Report,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get(
        &self,
        user_id: &Uuid,
        report_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Report>, RepositoryError>> + Send;
}
