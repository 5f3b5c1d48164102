/// Referral ledger: one-time linking of a referred user to a referrer,
/// with reward crediting
use crate::{
    account::{manager::user_from_row, Tier, User},
    error::{ApiError, ApiResult},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

/// Length of the user-facing referral code
const CODE_LEN: usize = 8;
const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Days of pro access credited to the referrer per successful referral
const REWARD_DAYS: i64 = 7;

pub struct ReferralLedger {
    db: SqlitePool,
}

impl ReferralLedger {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Apply a referral code on behalf of `user`.
    ///
    /// Guard order: the code must resolve to an existing user, must not be
    /// the caller's own, and the caller must not already carry a referral.
    /// Repeated application is an error, not a no-op. Both sides of the link
    /// are written in one transaction so a referrer is never credited
    /// without the caller being marked.
    pub async fn apply(&self, user: &User, code: &str) -> ApiResult<String> {
        let referrer_row = sqlx::query("SELECT * FROM users WHERE referral_code = ?1")
            .bind(code)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Invalid referral code".to_string()))?;
        let referrer = user_from_row(&referrer_row);

        if referrer.id == user.id {
            return Err(ApiError::Validation(
                "Cannot use your own referral code".to_string(),
            ));
        }

        if user.referred_by.is_some() {
            return Err(ApiError::Validation(
                "Referral code already applied".to_string(),
            ));
        }

        let now = Utc::now();
        let pro_until = now + Duration::days(REWARD_DAYS);

        let mut tx = self.db.begin().await.map_err(ApiError::Database)?;

        // The row-level guard is what actually enforces "set exactly once":
        // a concurrent apply that won the race leaves this update matching
        // zero rows, and dropping the transaction credits nobody.
        let marked = sqlx::query(
            "UPDATE users SET referred_by = ?1, referred_at = ?2
             WHERE id = ?3 AND referred_by IS NULL",
        )
        .bind(&referrer.id)
        .bind(now)
        .bind(&user.id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

        if marked.rows_affected() == 0 {
            return Err(ApiError::Validation(
                "Referral code already applied".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE users SET tier = ?1, pro_until = ?2, referral_count = referral_count + 1
             WHERE id = ?3",
        )
        .bind(Tier::Pro.as_str())
        .bind(pro_until)
        .bind(&referrer.id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::Database)?;

        tx.commit().await.map_err(ApiError::Database)?;

        info!(
            "Referral applied: {} referred by {} ({} total)",
            user.id,
            referrer.id,
            referrer.referral_count + 1
        );

        Ok(referrer.email)
    }

    /// Return the user's referral code, durably assigning a fresh one on
    /// first use. Retries on the rare unique-constraint collision.
    pub async fn issue_or_fetch_code(&self, user: &User) -> ApiResult<String> {
        if let Some(ref code) = user.referral_code {
            return Ok(code.clone());
        }

        for _ in 0..5 {
            let code = generate_code();
            let result = sqlx::query(
                "UPDATE users SET referral_code = ?1 WHERE id = ?2 AND referral_code IS NULL",
            )
            .bind(&code)
            .bind(&user.id)
            .execute(&self.db)
            .await;

            match result {
                Ok(_) => {
                    // A concurrent assignment may have won; read back the
                    // durable value.
                    let row = sqlx::query("SELECT referral_code FROM users WHERE id = ?1")
                        .bind(&user.id)
                        .fetch_one(&self.db)
                        .await
                        .map_err(ApiError::Database)?;
                    let assigned: Option<String> = sqlx::Row::get(&row, "referral_code");
                    return assigned
                        .ok_or_else(|| ApiError::Internal("Referral code not assigned".to_string()));
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => continue,
                Err(e) => return Err(ApiError::Database(e)),
            }
        }

        Err(ApiError::Internal(
            "Could not assign a unique referral code".to_string(),
        ))
    }
}

/// Generate a short, user-facing, collision-resistant code. The charset
/// drops easily confused characters (0/O, 1/I).
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}
