/// Account manager implementation using runtime queries
use crate::{
    account::{ProfileUpdate, Tier, User},
    auth::password,
    error::{ApiError, ApiResult},
};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Map a users row to the User model
pub(crate) fn user_from_row(row: &SqliteRow) -> User {
    let tier: String = row.get("tier");
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        photo: row.get("photo"),
        tier: Tier::parse(&tier),
        pro_until: row.get::<Option<DateTime<Utc>>, _>("pro_until"),
        subscription_id: row.get("subscription_id"),
        referral_code: row.get("referral_code"),
        referral_count: row.get("referral_count"),
        referred_by: row.get("referred_by"),
        referred_at: row.get::<Option<DateTime<Utc>>, _>("referred_at"),
        created_at: row.get("created_at"),
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, name, photo, tier, pro_until, \
     subscription_id, referral_code, referral_count, referred_by, referred_at, created_at";

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Register a new account
    pub async fn create_account(&self, email: &str, password_plain: &str) -> ApiResult<User> {
        if self.email_exists(email).await? {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = password::hash(password_plain);
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, tier, referral_count, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        )
        .bind(&id)
        .bind(email)
        .bind(&password_hash)
        .bind(Tier::Free.as_str())
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        tracing::info!("Account created: {}", id);

        Ok(User {
            id,
            email: email.to_string(),
            password_hash,
            name: None,
            photo: None,
            tier: Tier::Free,
            pro_until: None,
            subscription_id: None,
            referral_code: None,
            referral_count: 0,
            referred_by: None,
            referred_at: None,
            created_at: now,
        })
    }

    /// Authenticate with email and password
    pub async fn login(&self, email: &str, password_plain: &str) -> ApiResult<User> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::Authentication("Incorrect email or password".to_string()))?;

        if !password::verify(password_plain, &user.password_hash) {
            return Err(ApiError::Authentication(
                "Incorrect email or password".to_string(),
            ));
        }

        Ok(user)
    }

    /// Fetch a user by id
    pub async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Fetch a user by id, if present
    pub async fn find_by_id(&self, user_id: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Fetch a user by email, if present
    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = ?1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Apply a validated profile patch. Only the fields the patch structure
    /// enumerates can change.
    pub async fn update_profile(&self, user_id: &str, patch: &ProfileUpdate) -> ApiResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        if let Some(ref name) = patch.name {
            sqlx::query("UPDATE users SET name = ?1 WHERE id = ?2")
                .bind(name)
                .bind(user_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::Database)?;
        }

        if let Some(ref photo) = patch.photo {
            sqlx::query("UPDATE users SET photo = ?1 WHERE id = ?2")
                .bind(photo)
                .bind(user_id)
                .execute(&self.db)
                .await
                .map_err(ApiError::Database)?;
        }

        Ok(())
    }

    async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(row.is_some())
    }
}
