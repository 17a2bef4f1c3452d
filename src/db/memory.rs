// db/memory.rs
use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::error::{DatabaseError, ErrorKind};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{referraldb::ReferralCodeExt, userdb::UserExt};
use crate::models::{referralmodel::ReferralCode, usermodel::User};

/// Unique-constraint violation raised by the in-process store, named after
/// the matching Postgres constraint so callers handle both stores alike.
#[derive(Debug)]
struct UniqueViolation(&'static str);

impl fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate key value violates unique constraint \"{}\"", self.0)
    }
}

impl std::error::Error for UniqueViolation {}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.0)
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

fn unique_violation(constraint: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation(constraint)))
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    referral_codes: HashMap<Uuid, ReferralCode>,
}

/// In-process system of record used when no `DATABASE_URL` is configured.
///
/// Every mutation runs under a single write lock, so the deactivate-then-insert
/// sequence of [`ReferralCodeExt::create_referral_code`] is atomic here too.
#[derive(Debug, Default)]
pub struct MemoryDb {
    state: RwLock<MemoryState>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserExt for MemoryDb {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.read().await;

        let user = if let Some(user_id) = user_id {
            state.users.get(&user_id).cloned()
        } else if let Some(username) = username {
            state.users.values().find(|u| u.username == username).cloned()
        } else if let Some(email) = email {
            state.users.values().find(|u| u.email == email).cloned()
        } else {
            None
        };

        Ok(user)
    }

    async fn save_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, sqlx::Error> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == username) {
            return Err(unique_violation("users_username_key"));
        }
        if state.users.values().any(|u| u.email == email) {
            return Err(unique_violation("users_email_key"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            referred_by: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn set_referred_by(
        &self,
        user_id: Uuid,
        referrer_id: Uuid,
    ) -> Result<User, sqlx::Error> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&referrer_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.referred_by = Some(referrer_id);
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        let mut state = self.state.write().await;

        state.users.remove(&user_id);
        state.referral_codes.retain(|_, rc| rc.user_id != user_id);
        for user in state.users.values_mut() {
            if user.referred_by == Some(user_id) {
                user.referred_by = None;
            }
        }

        Ok(())
    }

    async fn get_referrals(&self, referrer_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
        let state = self.state.read().await;

        let mut referrals: Vec<User> = state
            .users
            .values()
            .filter(|u| u.referred_by == Some(referrer_id))
            .cloned()
            .collect();
        referrals.sort_by_key(|u| u.created_at);

        Ok(referrals)
    }
}

#[async_trait]
impl ReferralCodeExt for MemoryDb {
    async fn create_referral_code(
        &self,
        referral_code: &ReferralCode,
    ) -> Result<(ReferralCode, Vec<Uuid>), sqlx::Error> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&referral_code.user_id) {
            return Err(sqlx::Error::RowNotFound);
        }
        if state.referral_codes.contains_key(&referral_code.code) {
            return Err(unique_violation("referral_codes_pkey"));
        }

        let mut superseded = Vec::new();
        for existing in state.referral_codes.values_mut() {
            if existing.user_id == referral_code.user_id && existing.is_active {
                existing.is_active = false;
                superseded.push(existing.code);
            }
        }

        let mut created = referral_code.clone();
        created.is_active = true;
        state.referral_codes.insert(created.code, created.clone());

        Ok((created, superseded))
    }

    async fn get_referral_code(
        &self,
        code: Uuid,
        active_only: bool,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        let state = self.state.read().await;

        Ok(state
            .referral_codes
            .get(&code)
            .filter(|rc| rc.is_active || !active_only)
            .cloned())
    }

    async fn get_active_referral_code(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ReferralCode>, sqlx::Error> {
        let state = self.state.read().await;

        Ok(state
            .referral_codes
            .values()
            .find(|rc| rc.user_id == user_id && rc.is_active)
            .cloned())
    }

    async fn delete_referral_code(
        &self,
        code: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut state = self.state.write().await;

        let owned = state
            .referral_codes
            .get(&code)
            .map_or(false, |rc| rc.user_id == user_id);
        if owned {
            state.referral_codes.remove(&code);
        }

        Ok(owned)
    }
}
