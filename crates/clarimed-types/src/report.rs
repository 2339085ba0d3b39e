//! Extracted medical report storage type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An extracted report: the text blob plus its originating filename.
///
/// Owned by the uploading user. Chat messages reference it weakly by id;
/// deleting a report never cascades into the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}
