/// Generation collaborator boundary
///
/// The AI engine is an opaque, untrusted collaborator: it either returns a
/// structured result or faults. The orchestrator always wraps it with the
/// deterministic fallback, so a fault here never fails a request.
use crate::{
    config::GenerationConfig,
    error::{ApiError, ApiResult},
    strategy::{StrategyInput, StrategyResult},
};
use async_trait::async_trait;
use std::time::Duration;

/// A strategy generation collaborator
#[async_trait]
pub trait StrategyGenerator: Send + Sync {
    async fn generate(&self, input: &StrategyInput) -> ApiResult<StrategyResult>;
}

/// HTTP client for a remote generation service
pub struct RemoteGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteGenerator {
    /// Build a remote generator from configuration. Returns None when no
    /// endpoint is configured (fallback-only mode).
    pub fn from_config(config: &GenerationConfig) -> Option<Self> {
        let endpoint = config.endpoint.clone()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl StrategyGenerator for RemoteGenerator {
    async fn generate(&self, input: &StrategyInput) -> ApiResult<StrategyResult> {
        let mut request = self.client.post(&self.endpoint).json(input);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::ServiceUnavailable(format!("Generation call failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::ServiceUnavailable(format!(
                "Generation service returned {}",
                response.status()
            )));
        }

        response
            .json::<StrategyResult>()
            .await
            .map_err(|e| ApiError::Internal(format!("Malformed generation response: {}", e)))
    }
}
