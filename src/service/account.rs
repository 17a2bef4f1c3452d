// service/account.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::userdb::UserExt,
    error::ErrorMessage,
    models::usermodel::User,
    service::{email_verifier::EmailVerifier, error::ServiceError, referral::ReferralService},
    utils::password,
};

pub struct AccountService {
    db: Arc<dyn UserExt>,
    verifier: Arc<dyn EmailVerifier>,
    referrals: Arc<ReferralService>,
}

impl AccountService {
    pub fn new(
        db: Arc<dyn UserExt>,
        verifier: Arc<dyn EmailVerifier>,
        referrals: Arc<ReferralService>,
    ) -> Self {
        Self {
            db,
            verifier,
            referrals,
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(self.db.get_user(Some(user_id), None, None).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ServiceError> {
        self.db
            .get_user(None, None, Some(email))
            .await?
            .ok_or_else(|| ServiceError::Validation(ErrorMessage::UnknownEmail.to_string()))
    }

    /// Rejects the address unless the verifier reports it as valid.
    ///
    /// An unreachable verifier counts as a failed check.
    pub async fn verify_email(&self, email: &str) -> Result<(), ServiceError> {
        match self.verifier.verify(email).await {
            Some(verification) if verification.is_valid() => Ok(()),
            Some(verification) => {
                tracing::info!("Email {} rejected by verifier: {}", email, verification.status);
                Err(ServiceError::Validation(ErrorMessage::EmailInvalid.to_string()))
            }
            None => Err(ServiceError::Validation(
                ErrorMessage::EmailCheckFailed.to_string(),
            )),
        }
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        if self.db.get_user(None, Some(username), None).await?.is_some() {
            return Err(ServiceError::Conflict(ErrorMessage::UsernameExist.to_string()));
        }
        if self.db.get_user(None, None, Some(email)).await?.is_some() {
            return Err(ServiceError::Conflict(ErrorMessage::EmailExist.to_string()));
        }

        let hashed_password = password::hash(password)?;

        let user = self
            .db
            .save_user(username, email, &hashed_password)
            .await
            .map_err(|e| {
                let constraint = e
                    .as_database_error()
                    .and_then(|db_err| db_err.constraint())
                    .map(str::to_owned);
                match constraint.as_deref() {
                    Some("users_username_key") => {
                        ServiceError::Conflict(ErrorMessage::UsernameExist.to_string())
                    }
                    Some("users_email_key") => {
                        ServiceError::Conflict(ErrorMessage::EmailExist.to_string())
                    }
                    _ => ServiceError::Database(e),
                }
            })?;

        tracing::info!("User {} registered", user.username);
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let wrong_credentials =
            || ServiceError::Authentication(ErrorMessage::WrongCredentials.to_string());

        let user = self
            .db
            .get_user(None, Some(username), None)
            .await?
            .ok_or_else(wrong_credentials)?;

        let password_matched =
            password::compare(password, &user.password).map_err(|_| wrong_credentials())?;

        if password_matched {
            Ok(user)
        } else {
            Err(wrong_credentials())
        }
    }

    pub async fn list_referrals(&self, user_id: Uuid) -> Result<Vec<User>, ServiceError> {
        Ok(self.db.get_referrals(user_id).await?)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        self.verify_email(email).await?;
        self.create_user(username, email, password).await
    }

    /// Registers a user and, when a code is supplied, links them to its owner.
    ///
    /// If the code cannot be redeemed the freshly created account is removed
    /// again, so a rejected registration leaves nothing behind.
    pub async fn register_with_referral(
        &self,
        username: &str,
        email: &str,
        password: &str,
        referral_code: Option<&str>,
    ) -> Result<User, ServiceError> {
        self.verify_email(email).await?;
        let user = self.create_user(username, email, password).await?;

        let Some(raw_code) = referral_code.filter(|code| !code.trim().is_empty()) else {
            return Ok(user);
        };

        let linked = match self.referrals.resolve_for_registration(raw_code).await {
            Ok(referral) => self
                .db
                .set_referred_by(user.id, referral.user_id)
                .await
                .map_err(ServiceError::from),
            Err(e) => Err(e),
        };

        match linked {
            Ok(linked) => {
                tracing::info!(
                    "Referral successful: {:?} referred {}",
                    linked.referred_by,
                    linked.username
                );
                Ok(linked)
            }
            Err(e) => {
                tracing::info!(
                    "Referral code rejected for {}: {}; rolling back registration",
                    user.username,
                    e
                );
                if let Err(rollback) = self.db.delete_user(user.id).await {
                    tracing::error!("Failed to roll back user {}: {}", user.id, rollback);
                }
                Err(e)
            }
        }
    }
}
