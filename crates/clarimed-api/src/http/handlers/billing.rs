//! Billing handlers: plan catalog and payment gateway callback.
//!
//! Endpoints:
//! - GET  /api/v1/billing/plans    - The static plan catalog (unauthenticated)
//! - POST /api/v1/billing/callback - Gateway-to-server payment confirmation
//!   (unauthenticated; trust comes from the HMAC signature)

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use secrecy::ExposeSecret;
use serde::Deserialize;
use uuid::Uuid;

use clarimed_infra::payment::{OrderReference, verify_callback_signature};
use clarimed_types::billing::{ActivationOutcome, PaymentNotice};
use clarimed_types::error::PaymentError;
use clarimed_types::plan::{Plan, PlanId};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Payment gateway callback payload.
#[derive(Debug, Deserialize)]
pub struct PaymentCallback {
    /// `<order_id>:<user_id>:<plan_id>`, minted at checkout and echoed back
    /// by the gateway unchanged.
    pub order_reference: String,
    pub payment_reference: String,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Lowercase hex HMAC-SHA256 over `order_reference|payment_reference`.
    pub signature: String,
}

/// GET /api/v1/billing/plans - The plan catalog.
pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Plan>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let plans = state.subscription_service.catalog().plans.clone();

    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(plans, request_id, elapsed)
        .with_link("self", "/api/v1/billing/plans");

    Ok(Json(resp))
}

/// POST /api/v1/billing/callback - Apply a completed payment.
///
/// Verification gates everything: a bad signature is rejected with 403 and
/// no state changes. The order reference then names the user and plan, and
/// activation is idempotent on the payment reference, so gateway redelivery
/// is harmless.
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(callback): Json<PaymentCallback>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let secret = state.secrets.merchant_secret.as_ref().ok_or_else(|| {
        AppError::Config("Payment processing is not configured".to_string())
    })?;

    if let Err(err) = verify_callback_signature(
        secret.expose_secret().as_bytes(),
        &callback.order_reference,
        &callback.payment_reference,
        &callback.signature,
    ) {
        tracing::warn!(
            order_reference = %callback.order_reference,
            payment_reference = %callback.payment_reference,
            "Rejected payment callback: signature verification failed"
        );
        return Err(err.into());
    }

    let order: OrderReference = callback.order_reference.parse()?;
    let plan_id: PlanId = order
        .plan_id
        .parse()
        .map_err(|_| PaymentError::UnknownPlan(order.plan_id.clone()))?;

    let notice = PaymentNotice {
        order_reference: callback.order_reference.clone(),
        payment_reference: callback.payment_reference.clone(),
        amount_minor: callback.amount,
    };
    let outcome = state
        .subscription_service
        .activate(&order.user_id, plan_id, &notice)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;

    let data = match outcome {
        ActivationOutcome::Activated(activation) => serde_json::json!({
            "status": "activated",
            "plan": activation.plan,
            "expires_at": activation.expires_at,
        }),
        ActivationOutcome::AlreadyProcessed => serde_json::json!({
            "status": "already_processed",
        }),
    };

    let resp = ApiResponse::success(data, request_id, elapsed)
        .with_link("plans", "/api/v1/billing/plans");

    Ok(Json(resp))
}
