// db/referraldb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::referralmodel::ReferralCode;

const REFERRAL_CODE_COLUMNS: &str = "code, user_id, expiration_date, is_active, created_at";

#[async_trait]
pub trait ReferralCodeExt: Send + Sync {
    /// Persists `referral_code` as its owner's only active code.
    ///
    /// The owner's previously active codes are deactivated in the same atomic
    /// step; their code values are returned alongside the stored record.
    async fn create_referral_code(
        &self,
        referral_code: &ReferralCode,
    ) -> Result<(ReferralCode, Vec<Uuid>), sqlx::Error>;

    async fn get_referral_code(
        &self,
        code: Uuid,
        active_only: bool,
    ) -> Result<Option<ReferralCode>, sqlx::Error>;

    async fn get_active_referral_code(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ReferralCode>, sqlx::Error>;

    /// Removes `code` if it belongs to `user_id`. Returns whether a record was removed.
    async fn delete_referral_code(
        &self,
        code: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl ReferralCodeExt for DBClient {
    async fn create_referral_code(
        &self,
        referral_code: &ReferralCode,
    ) -> Result<(ReferralCode, Vec<Uuid>), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the owner serialises concurrent creators for the same user.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(referral_code.user_id)
            .fetch_one(&mut *tx)
            .await?;

        let superseded: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE referral_codes
            SET is_active = FALSE
            WHERE user_id = $1 AND is_active = TRUE
            RETURNING code
            "#,
        )
        .bind(referral_code.user_id)
        .fetch_all(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, ReferralCode>(&format!(
            r#"
            INSERT INTO referral_codes (code, user_id, expiration_date, is_active, created_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING {}
            "#,
            REFERRAL_CODE_COLUMNS
        ))
        .bind(referral_code.code)
        .bind(referral_code.user_id)
        .bind(referral_code.expiration_date)
        .bind(referral_code.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((created, superseded))
    }

    async fn get_referral_code(
        &self,
        code: Uuid,
        active_only: bool,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(&format!(
            "SELECT {} FROM referral_codes WHERE code = $1 AND (is_active OR NOT $2)",
            REFERRAL_CODE_COLUMNS
        ))
        .bind(code)
        .bind(active_only)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_active_referral_code(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        sqlx::query_as::<_, ReferralCode>(&format!(
            "SELECT {} FROM referral_codes WHERE user_id = $1 AND is_active = TRUE LIMIT 1",
            REFERRAL_CODE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_referral_code(
        &self,
        code: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM referral_codes WHERE code = $1 AND user_id = $2")
            .bind(code)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
