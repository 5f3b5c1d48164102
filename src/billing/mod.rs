/// Payment integration: webhook-driven subscription state machine and the
/// outbound subscription-creation client
///
/// Tier transitions are driven entirely by signed webhook events from the
/// billing provider, independent of the generation request flow. An event
/// whose signature cannot be verified against the shared secret is rejected
/// before it reaches the state machine.
use crate::{
    account::Tier,
    config::BillingConfig,
    error::{ApiError, ApiResult},
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Verify the webhook signature: hex HMAC-SHA256 of the raw body under the
/// shared secret. Comparison is constant-time via the Mac verifier.
pub fn verify_webhook_signature(body: &[u8], signature: &str, secret: &str) -> ApiResult<()> {
    let expected = hex::decode(signature)
        .map_err(|_| ApiError::Signature("Signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Internal(format!("HMAC key setup failed: {}", e)))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| ApiError::Signature("Webhook signature mismatch".to_string()))
}

/// Inbound subscription event payload
#[derive(Debug, Deserialize)]
pub struct SubscriptionEvent {
    pub event: String,
    pub subscription: SubscriptionEntity,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionEntity {
    pub id: String,
    #[serde(default)]
    pub notes: SubscriptionNotes,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionNotes {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// Subscription state machine over the user table
pub struct SubscriptionManager {
    db: SqlitePool,
}

impl SubscriptionManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Apply a verified subscription event.
    ///
    /// Events missing the embedded user id, or carrying an unknown event
    /// type, are ignored without error; the sender gets the same
    /// acknowledgement either way.
    pub async fn apply(&self, event: &SubscriptionEvent) -> ApiResult<()> {
        let Some(user_id) = event.subscription.notes.user_id.as_deref() else {
            debug!("Subscription event {} without user id, ignoring", event.event);
            return Ok(());
        };

        match event.event.as_str() {
            "subscription.activated" => self.activate(user_id, &event.subscription.id).await,
            "subscription.cancelled" => self.cancel(user_id).await,
            other => {
                debug!("Unhandled subscription event type: {}", other);
                Ok(())
            }
        }
    }

    /// free -> pro, recording the external subscription identifier. Any
    /// time-bounded pro grant (referral reward) is superseded by the paid
    /// subscription, so pro_until is cleared.
    async fn activate(&self, user_id: &str, subscription_id: &str) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE users SET tier = ?1, subscription_id = ?2, pro_until = NULL WHERE id = ?3",
        )
        .bind(Tier::Pro.as_str())
        .bind(subscription_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        if result.rows_affected() == 0 {
            warn!("Subscription activated for unknown user {}", user_id);
        } else {
            info!("User {} upgraded to pro via subscription {}", user_id, subscription_id);
        }

        Ok(())
    }

    /// pro -> free
    async fn cancel(&self, user_id: &str) -> ApiResult<()> {
        let result =
            sqlx::query("UPDATE users SET tier = ?1, subscription_id = NULL WHERE id = ?2")
                .bind(Tier::Free.as_str())
                .bind(user_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::Database)?;

        if result.rows_affected() == 0 {
            warn!("Subscription cancelled for unknown user {}", user_id);
        } else {
            info!("User {} downgraded to free (subscription cancelled)", user_id);
        }

        Ok(())
    }
}

/// Response to a checkout request: the client confirms the subscription with
/// the provider using these
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub subscription_id: String,
    pub key_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateSubscriptionResponse {
    id: String,
}

/// Outbound client for the billing provider's REST API
pub struct BillingClient {
    client: reqwest::Client,
    config: BillingConfig,
}

impl BillingClient {
    pub fn new(config: BillingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn webhook_secret(&self) -> &str {
        &self.config.webhook_secret
    }

    /// Create a recurring subscription for a user, tagging it with the user
    /// id so the webhook can route the eventual activation back to them.
    pub async fn create_subscription(
        &self,
        user_id: &str,
        email: &str,
    ) -> ApiResult<CheckoutResponse> {
        let body = serde_json::json!({
            "plan_id": self.config.plan_id,
            "customer_notify": 1,
            "quantity": 1,
            "total_count": 12,
            "notes": {
                "user_id": user_id,
                "email": email,
            }
        });

        let response = self
            .client
            .post(format!("{}/subscriptions", self.config.api_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::ServiceUnavailable(format!("Billing call failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::ServiceUnavailable(format!(
                "Billing provider returned {}",
                response.status()
            )));
        }

        let created: CreateSubscriptionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Internal(format!("Malformed billing response: {}", e)))?;

        Ok(CheckoutResponse {
            subscription_id: created.id,
            key_id: self.config.key_id.clone(),
        })
    }
}
