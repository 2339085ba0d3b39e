//! User identity and subscription state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::PlanId;

/// A registered user.
///
/// `plan`/`plan_expires_at` are the single source of truth for quota
/// decisions. An expired non-free plan is corrected to free lazily on read,
/// never by a background sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Stable identifier from the external identity provider; opaque here.
    pub external_id: String,
    pub display_name: String,
    pub picture_url: Option<String>,
    pub email: String,
    pub plan: PlanId,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// Payload from the external identity provider on successful login.
///
/// The server upserts by `external_user_id` and refreshes the profile
/// fields; it never interprets the id beyond equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub external_user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    pub email: String,
}
