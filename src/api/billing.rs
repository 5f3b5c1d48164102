/// Billing endpoints: checkout and the inbound payment webhook
use crate::{
    auth::AuthContext,
    billing::{self, SubscriptionEvent},
    context::AppContext,
    error::{ApiError, ApiResult},
};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::json;

/// Build billing routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/billing/checkout", post(create_checkout))
        .route("/api/billing/webhook", post(handle_webhook))
}

/// Create a pro-tier subscription with the billing provider
async fn create_checkout(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<serde_json::Value>> {
    let billing = ctx.billing.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Billing is not configured".to_string())
    })?;

    let checkout = billing
        .create_subscription(&auth.user.id, &auth.user.email)
        .await?;

    Ok(Json(json!({
        "subscription_id": checkout.subscription_id,
        "key_id": checkout.key_id,
    })))
}

/// Inbound signed subscription event.
///
/// The signature over the raw body is verified before the payload is even
/// parsed; an unverifiable event never reaches the state machine. A verified
/// event is acknowledged with a fixed body whether or not it matched a user.
async fn handle_webhook(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let billing = ctx.billing.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Billing is not configured".to_string())
    })?;

    let signature = headers
        .get("x-webhook-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Signature("Missing signature header".to_string()))?;

    billing::verify_webhook_signature(&body, signature, billing.webhook_secret())?;

    let event: SubscriptionEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Malformed webhook payload: {}", e)))?;

    ctx.subscriptions.apply(&event).await?;

    Ok(Json(json!({ "status": "success" })))
}
