/// Configuration management for the Stratify backend
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub quota: QuotaConfig,
    pub generation: GenerationConfig,
    pub billing: Option<BillingConfig>,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database_path: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Access token lifetime in hours
    pub token_ttl_hours: i64,
}

/// Volatile counter/cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL (e.g. "redis://localhost:6379")
    pub redis_url: String,

    /// Key prefix for all cache entries
    pub key_prefix: String,

    /// Result cache TTL in seconds (default: 86400 = 24 hours)
    pub result_ttl: u64,

    /// Usage counter rolling-window length in seconds (default: 86400)
    pub usage_window: u64,
}

/// Generation quota configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Strategies per rolling window on the free tier
    pub free_limit: u64,
    /// Strategies per rolling window on the pro tier
    pub pro_limit: u64,
}

/// Generation collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Remote generation endpoint; absent means fallback-only mode
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Bound on a single generation call in seconds
    pub timeout_secs: u64,
}

/// Billing provider configuration (subscription creation + webhooks)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub plan_id: String,
    pub webhook_secret: String,
}

/// Global request throttle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("STRATIFY_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("STRATIFY_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;
        let version = env::var("STRATIFY_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("STRATIFY_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database_path = env::var("STRATIFY_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("stratify.sqlite"));

        let jwt_secret = env::var("STRATIFY_JWT_SECRET")
            .map_err(|_| ApiError::Validation("JWT secret required".to_string()))?;
        let token_ttl_hours = env::var("STRATIFY_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix =
            env::var("STRATIFY_CACHE_PREFIX").unwrap_or_else(|_| "stratify:".to_string());
        let result_ttl = env::var("STRATIFY_RESULT_TTL")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);
        let usage_window = env::var("STRATIFY_USAGE_WINDOW")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let free_limit = env::var("STRATIFY_FREE_LIMIT")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3);
        let pro_limit = env::var("STRATIFY_PRO_LIMIT")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .unwrap_or(500);

        let generation_endpoint = env::var("STRATIFY_GENERATION_URL").ok();
        let generation_api_key = env::var("STRATIFY_GENERATION_API_KEY").ok();
        let generation_timeout = env::var("STRATIFY_GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        // Billing is optional; the service runs without it (checkout returns 503)
        let billing = match (
            env::var("BILLING_KEY_ID").ok(),
            env::var("BILLING_KEY_SECRET").ok(),
        ) {
            (Some(key_id), Some(key_secret)) => Some(BillingConfig {
                api_url: env::var("BILLING_API_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
                key_id,
                key_secret,
                plan_id: env::var("BILLING_PLAN_ID").unwrap_or_default(),
                webhook_secret: env::var("BILLING_WEBHOOK_SECRET").unwrap_or_default(),
            }),
            _ => None,
        };

        let rate_limit_enabled = env::var("STRATIFY_RATE_LIMIT_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let requests_per_minute = env::var("STRATIFY_RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database_path,
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_hours,
            },
            cache: CacheConfig {
                redis_url,
                key_prefix,
                result_ttl,
                usage_window,
            },
            quota: QuotaConfig {
                free_limit,
                pro_limit,
            },
            generation: GenerationConfig {
                endpoint: generation_endpoint,
                api_key: generation_api_key,
                timeout_secs: generation_timeout,
            },
            billing,
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                requests_per_minute,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(ApiError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.quota.free_limit == 0 {
            return Err(ApiError::Validation(
                "Free tier quota must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8000,
                version: "0.1.0".to_string(),
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                database_path: "./data/stratify.sqlite".into(),
            },
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                token_ttl_hours: 24,
            },
            cache: CacheConfig {
                redis_url: "redis://localhost:6379".to_string(),
                key_prefix: "stratify:".to_string(),
                result_ttl: 86400,
                usage_window: 86400,
            },
            quota: QuotaConfig {
                free_limit: 3,
                pro_limit: 500,
            },
            generation: GenerationConfig {
                endpoint: None,
                api_key: None,
                timeout_secs: 60,
            },
            billing: None,
            rate_limit: RateLimitConfig {
                enabled: true,
                requests_per_minute: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut config = test_config();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_free_limit_rejected() {
        let mut config = test_config();
        config.quota.free_limit = 0;
        assert!(config.validate().is_err());
    }
}
