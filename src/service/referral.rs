// service/referral.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{cache::ReferralCodeCache, referraldb::ReferralCodeExt},
    error::ErrorMessage,
    models::referralmodel::ReferralCode,
    service::error::ServiceError,
};

/// Referral-code lifecycle over the store, keeping the cache mirror in step
/// on every mutating path.
pub struct ReferralService {
    db: Arc<dyn ReferralCodeExt>,
    cache: Arc<dyn ReferralCodeCache>,
}

impl ReferralService {
    pub fn new(db: Arc<dyn ReferralCodeExt>, cache: Arc<dyn ReferralCodeCache>) -> Self {
        Self { db, cache }
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    /// Issues a new active code for `user_id`, superseding any active one.
    pub async fn create(
        &self,
        user_id: Uuid,
        expiration_date: DateTime<Utc>,
    ) -> Result<ReferralCode, ServiceError> {
        if expiration_date <= Utc::now() {
            return Err(ServiceError::Validation(
                ErrorMessage::ExpirationInPast.to_string(),
            ));
        }

        let (created, superseded) = self
            .db
            .create_referral_code(&ReferralCode::new(user_id, expiration_date))
            .await?;

        // Superseded codes are no longer usable, so drop their snapshots.
        for code in superseded {
            tracing::info!("Referral code {} superseded for user {}", code, user_id);
            self.evict(code).await;
        }

        self.mirror(&created).await;

        tracing::info!(
            "Referral code {} created for user {} (expires {})",
            created.code,
            user_id,
            created.expiration_date
        );

        Ok(created)
    }

    /// Removes `code` if owned by `user_id`, along with its cache entry.
    pub async fn delete(&self, code: Uuid, user_id: Uuid) -> Result<(), ServiceError> {
        let deleted = self.db.delete_referral_code(code, user_id).await?;
        if !deleted {
            return Err(ServiceError::NotFound(
                ErrorMessage::ReferralCodeNotFound.to_string(),
            ));
        }

        self.evict(code).await;
        tracing::info!("Referral code {} deleted by user {}", code, user_id);

        Ok(())
    }

    pub async fn find_active_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ReferralCode>, ServiceError> {
        Ok(self.db.get_active_referral_code(user_id).await?)
    }

    /// Cached snapshot of the owner's usable code.
    ///
    /// The store decides whether an active, unexpired code exists; the value
    /// returned is whatever the cache holds for it.
    pub async fn lookup_for_owner(&self, user_id: Uuid) -> Result<ReferralCode, ServiceError> {
        let active = self
            .find_active_for_user(user_id)
            .await?
            .filter(|code| code.is_usable())
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::NoActiveReferralCode.to_string()))?;

        self.cached(active.code)
            .await
            .ok_or_else(|| ServiceError::NotFound(ErrorMessage::ReferralCodeNotCached.to_string()))
    }

    /// Resolves a code supplied at registration to the referring code record.
    pub async fn resolve_for_registration(&self, raw: &str) -> Result<ReferralCode, ServiceError> {
        let invalid = || ServiceError::Validation(ErrorMessage::InvalidReferralCode.to_string());

        let code = Uuid::parse_str(raw.trim()).map_err(|_| invalid())?;
        let referral = self
            .db
            .get_referral_code(code, true)
            .await?
            .ok_or_else(invalid)?;

        if referral.is_expired() {
            return Err(ServiceError::Validation(
                ErrorMessage::ReferralCodeExpired.to_string(),
            ));
        }

        Ok(referral)
    }

    pub async fn cached(&self, code: Uuid) -> Option<ReferralCode> {
        match self.cache.get(code).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Cache read failed for referral code {}: {}", code, e);
                None
            }
        }
    }

    async fn mirror(&self, referral_code: &ReferralCode) {
        if let Err(e) = self.cache.set(referral_code).await {
            tracing::warn!("Failed to cache referral code {}: {}", referral_code.code, e);
        }
    }

    async fn evict(&self, code: Uuid) {
        if let Err(e) = self.cache.delete(code).await {
            tracing::warn!("Failed to evict referral code {} from cache: {}", code, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{cache::MemoryReferralCodeCache, memory::MemoryDb, userdb::UserExt};
    use chrono::Duration;

    struct Fixture {
        db: Arc<MemoryDb>,
        cache: Arc<MemoryReferralCodeCache>,
        service: ReferralService,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(MemoryDb::new());
        let cache = Arc::new(MemoryReferralCodeCache::new());
        let service = ReferralService::new(db.clone(), cache.clone());
        Fixture { db, cache, service }
    }

    async fn user(db: &MemoryDb, name: &str) -> Uuid {
        db.save_user(name, &format!("{}@x.com", name), "hash")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_mirrors_into_cache() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;

        let created = f
            .service
            .create(alice, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(created.is_active);
        assert_eq!(created.user_id, alice);
        let stored = f.db.get_referral_code(created.code, false).await.unwrap();
        assert_eq!(f.cache.get(created.code).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_expiration_must_be_in_future() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;

        for expiration in [Utc::now(), Utc::now() - Duration::seconds(1), Utc::now() - Duration::days(3)] {
            match f.service.create(alice, expiration).await {
                Err(ServiceError::Validation(msg)) => {
                    assert_eq!(msg, "Expiration date cannot be in the past.")
                }
                other => panic!("expected validation error, got {:?}", other),
            }
        }
        assert!(f.service.find_active_for_user(alice).await.unwrap().is_none());

        assert!(f
            .service
            .create(alice, Utc::now() + Duration::seconds(30))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_single_active_code_per_user() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;
        let bob = user(&f.db, "bob").await;

        let bob_code = f
            .service
            .create(bob, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let mut codes = Vec::new();
        for hours in 1..=5 {
            codes.push(
                f.service
                    .create(alice, Utc::now() + Duration::hours(hours))
                    .await
                    .unwrap(),
            );
        }

        let mut active = 0;
        for code in &codes {
            let stored = f.db.get_referral_code(code.code, false).await.unwrap().unwrap();
            if stored.is_active {
                active += 1;
            }
        }
        assert_eq!(active, 1);

        let latest = codes.last().unwrap();
        let found = f.service.find_active_for_user(alice).await.unwrap().unwrap();
        assert_eq!(found.code, latest.code);

        // another user's code is untouched
        let bob_found = f.service.find_active_for_user(bob).await.unwrap().unwrap();
        assert_eq!(bob_found.code, bob_code.code);
    }

    #[tokio::test]
    async fn test_superseded_code_evicted_from_cache() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;

        let first = f
            .service
            .create(alice, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        let second = f
            .service
            .create(alice, Utc::now() + Duration::hours(2))
            .await
            .unwrap();

        assert!(f.cache.get(first.code).await.unwrap().is_none());
        assert!(f.cache.get(second.code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_creates_leave_one_active() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;
        let service = Arc::new(f.service);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create(alice, Utc::now() + Duration::hours(1))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap());
        }

        let mut active = 0;
        for code in &created {
            if f.db
                .get_referral_code(code.code, true)
                .await
                .unwrap()
                .is_some()
            {
                active += 1;
            }
        }
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_cache() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;
        let code = f
            .service
            .create(alice, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        f.service.delete(code.code, alice).await.unwrap();

        assert!(f.cache.get(code.code).await.unwrap().is_none());
        assert!(f.db.get_referral_code(code.code, false).await.unwrap().is_none());
        assert!(f.service.find_active_for_user(alice).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_enforces_ownership() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;
        let mallory = user(&f.db, "mallory").await;
        let code = f
            .service
            .create(alice, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        match f.service.delete(code.code, mallory).await {
            Err(ServiceError::NotFound(msg)) => assert_eq!(msg, "Referral code not found"),
            other => panic!("expected not found, got {:?}", other),
        }
        assert!(f.cache.get(code.code).await.unwrap().is_some());

        assert!(matches!(
            f.service.delete(Uuid::new_v4(), alice).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_for_owner() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;

        assert!(matches!(
            f.service.lookup_for_owner(alice).await,
            Err(ServiceError::NotFound(msg)) if msg == "No active referral code found or code has expired"
        ));

        let code = f
            .service
            .create(alice, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(f.service.lookup_for_owner(alice).await.unwrap(), code);

        f.cache.delete(code.code).await.unwrap();
        assert!(matches!(
            f.service.lookup_for_owner(alice).await,
            Err(ServiceError::NotFound(msg)) if msg == "Referral code not found in cache."
        ));
    }

    #[tokio::test]
    async fn test_lookup_for_owner_lazy_expiry() {
        let f = fixture();
        let alice = user(&f.db, "alice").await;

        let mut stale = ReferralCode::new(alice, Utc::now() + Duration::hours(1));
        stale.expiration_date = Utc::now() - Duration::minutes(1);
        f.db.create_referral_code(&stale).await.unwrap();
        f.cache.set(&stale).await.unwrap();

        let active = f.service.find_active_for_user(alice).await.unwrap().unwrap();
        assert!(active.is_active);
        assert!(active.is_expired());
        assert!(matches!(
            f.service.lookup_for_owner(alice).await,
            Err(ServiceError::NotFound(msg)) if msg == "No active referral code found or code has expired"
        ));
    }

    #[tokio::test]
    async fn test_resolve_for_registration() {
        let f = fixture();
        let bob = user(&f.db, "bob").await;
        let code = f
            .service
            .create(bob, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        let resolved = f
            .service
            .resolve_for_registration(&code.code.to_string())
            .await
            .unwrap();
        assert_eq!(resolved.user_id, bob);

        let unknown = Uuid::new_v4().to_string();
        for raw in ["not-a-code", "", unknown.as_str()] {
            assert!(matches!(
                f.service.resolve_for_registration(raw).await,
                Err(ServiceError::Validation(msg)) if msg == "Invalid referral code."
            ));
        }

        // superseded codes are no longer redeemable
        f.service
            .create(bob, Utc::now() + Duration::hours(2))
            .await
            .unwrap();
        assert!(matches!(
            f.service.resolve_for_registration(&code.code.to_string()).await,
            Err(ServiceError::Validation(msg)) if msg == "Invalid referral code."
        ));
    }

    #[tokio::test]
    async fn test_resolve_expired_code() {
        let f = fixture();
        let bob = user(&f.db, "bob").await;
        let mut expired = ReferralCode::new(bob, Utc::now() + Duration::hours(1));
        expired.expiration_date = Utc::now() - Duration::hours(1);
        f.db.create_referral_code(&expired).await.unwrap();

        assert!(matches!(
            f.service.resolve_for_registration(&expired.code.to_string()).await,
            Err(ServiceError::Validation(msg)) if msg == "Referral code has expired."
        ));
    }
}
