/// Referral endpoints
use crate::{
    api::validate_payload,
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Build referral routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/referral/apply", post(apply_referral))
        .route("/api/referral/code", get(get_referral_code))
}

#[derive(Debug, Deserialize, Validate)]
struct ApplyReferralRequest {
    #[validate(length(min = 6, max = 10, message = "Referral code must be 6-10 characters"))]
    referral_code: String,
}

/// Apply a referral code on behalf of the caller
async fn apply_referral(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<ApplyReferralRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    validate_payload(&req)?;

    let referrer_email = ctx.referrals.apply(&auth.user, &req.referral_code).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Referral applied! {} has been credited.", referrer_email),
    })))
}

/// Fetch (or lazily assign) the caller's referral code
async fn get_referral_code(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<serde_json::Value>> {
    let code = ctx.referrals.issue_or_fetch_code(&auth.user).await?;

    Ok(Json(json!({
        "referral_code": code,
        "referral_count": auth.user.referral_count,
    })))
}
