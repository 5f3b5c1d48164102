/// Account types and the account manager
pub mod manager;

pub use manager::AccountManager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pro" => Tier::Pro,
            _ => Tier::Free,
        }
    }
}

/// A registered user
///
/// Owned by the account subsystem; the generation pipeline only reads the
/// tier and mutates usage-adjacent fields (referral, subscription).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub photo: Option<String>,
    pub tier: Tier,
    pub pro_until: Option<DateTime<Utc>>,
    pub subscription_id: Option<String>,
    pub referral_code: Option<String>,
    pub referral_count: i64,
    pub referred_by: Option<String>,
    pub referred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Tier in effect right now. A pro grant with an elapsed expiry
    /// (e.g. a referral reward) reads as free.
    pub fn effective_tier(&self, now: DateTime<Utc>) -> Tier {
        match (self.tier, self.pro_until) {
            (Tier::Pro, Some(until)) if until < now => Tier::Free,
            (tier, _) => tier,
        }
    }
}

/// Signup request payload
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token response returned by signup and login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: String,
    pub email: String,
}

/// Explicit patch structure enumerating the mutable profile fields.
/// Anything not named here cannot be changed through the profile endpoint.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(max = 100, message = "Name too long"))]
    pub name: Option<String>,
    #[validate(length(max = 2048, message = "Photo URL too long"))]
    pub photo: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.photo.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user_with_tier(tier: Tier, pro_until: Option<DateTime<Utc>>) -> User {
        User {
            id: "u1".to_string(),
            email: "a@b.c".to_string(),
            password_hash: String::new(),
            name: None,
            photo: None,
            tier,
            pro_until,
            subscription_id: None,
            referral_code: None,
            referral_count: 0,
            referred_by: None,
            referred_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pro_without_expiry_stays_pro() {
        let user = user_with_tier(Tier::Pro, None);
        assert_eq!(user.effective_tier(Utc::now()), Tier::Pro);
    }

    #[test]
    fn test_expired_pro_grant_reads_as_free() {
        let now = Utc::now();
        let user = user_with_tier(Tier::Pro, Some(now - Duration::days(1)));
        assert_eq!(user.effective_tier(now), Tier::Free);
    }

    #[test]
    fn test_active_pro_grant_reads_as_pro() {
        let now = Utc::now();
        let user = user_with_tier(Tier::Pro, Some(now + Duration::days(6)));
        assert_eq!(user.effective_tier(now), Tier::Pro);
    }

    #[test]
    fn test_tier_round_trip() {
        assert_eq!(Tier::parse("pro"), Tier::Pro);
        assert_eq!(Tier::parse("free"), Tier::Free);
        assert_eq!(Tier::parse("garbage"), Tier::Free);
        assert_eq!(Tier::Pro.as_str(), "pro");
    }
}
