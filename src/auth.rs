/// Authentication: JWT issuance/verification and the request extractor
use crate::{
    account::User,
    context::AppContext,
    error::{ApiError, ApiResult},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims carried by access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id
    pub sub: String,
    /// Expiry as unix timestamp
    pub exp: i64,
}

/// Issue an access token for a user
pub fn create_access_token(user_id: &str, jwt_secret: &str, ttl_hours: i64) -> ApiResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token encoding failed: {}", e)))
}

/// Verify a JWT access token
///
/// This performs:
/// 1. Signature verification
/// 2. Expiration checking
/// 3. Claims extraction
pub fn verify_access_token(token: &str, jwt_secret: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ApiError::Authentication("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::Authentication("Invalid token signature".to_string())
            }
            _ => ApiError::Authentication(format!("Invalid token: {}", e)),
        }
    })?;

    Ok(data.claims)
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Authenticated context - validates the bearer token and resolves the user
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?;

        let claims = verify_access_token(&token, &state.config.auth.jwt_secret)?;

        // The subject claim must resolve to a live account
        let user = state
            .accounts
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::Authentication("User not found".to_string()))?;

        Ok(AuthContext { user })
    }
}

/// Salted SHA-256 password hashing in "salt$digest" form
pub mod password {
    use rand::Rng;
    use sha2::{Digest, Sha256};

    fn digest(password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(salt.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(password: &str) -> String {
        let salt: [u8; 16] = rand::thread_rng().gen();
        let salt = hex::encode(salt);
        let digest = digest(password, &salt);
        format!("{}${}", salt, digest)
    }

    /// Verify a password against a stored "salt$digest" hash
    pub fn verify(password: &str, stored: &str) -> bool {
        match stored.split_once('$') {
            Some((salt, expected)) => digest(password, salt) == expected,
            None => false,
        }
    }
}
