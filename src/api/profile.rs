/// Profile endpoints
use crate::{
    account::ProfileUpdate,
    api::validate_payload,
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

/// Build profile routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile", put(update_profile))
}

/// Current profile with usage accounting
async fn get_profile(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<serde_json::Value>> {
    let user = &auth.user;

    let usage_month = ctx.quota.usage(&user.id).await;
    let total_strategies = ctx.strategies.count_for_user(&user.id).await?;

    let name = user
        .name
        .clone()
        .unwrap_or_else(|| user.email.split('@').next().unwrap_or_default().to_string());

    Ok(Json(json!({
        "name": name,
        "email": user.email,
        "tier": user.effective_tier(chrono::Utc::now()),
        "usage_month": usage_month,
        "total_strategies": total_strategies,
        "photo": user.photo,
    })))
}

/// Apply an explicit profile patch
async fn update_profile(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(patch): Json<ProfileUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    validate_payload(&patch)?;

    ctx.accounts.update_profile(&auth.user.id, &patch).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated",
    })))
}
