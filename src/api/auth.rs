/// Authentication endpoints
use crate::{
    account::{LoginRequest, SignupRequest, TokenResponse},
    api::validate_payload,
    auth::{self, AuthContext},
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

/// Register a new account and issue an access token
async fn signup(
    State(ctx): State<AppContext>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<TokenResponse>> {
    validate_payload(&req)?;

    let user = ctx.accounts.create_account(&req.email, &req.password).await?;
    let access_token = auth::create_access_token(
        &user.id,
        &ctx.config.auth.jwt_secret,
        ctx.config.auth.token_ttl_hours,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_id: user.id,
        email: user.email,
    }))
}

/// Authenticate and issue an access token
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = ctx.accounts.login(&req.email, &req.password).await?;
    let access_token = auth::create_access_token(
        &user.id,
        &ctx.config.auth.jwt_secret,
        ctx.config.auth.token_ttl_hours,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_id: user.id,
        email: user.email,
    }))
}

/// Current user info
async fn me(auth: AuthContext) -> Json<serde_json::Value> {
    let user = auth.user;
    Json(json!({
        "id": user.id,
        "email": user.email,
        "tier": user.effective_tier(chrono::Utc::now()),
        "created_at": user.created_at,
    }))
}
