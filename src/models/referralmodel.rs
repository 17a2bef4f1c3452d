use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A referral code owned by a single user.
///
/// At most one code per user carries `is_active = true`. Expiry is never swept
/// in the background; it is evaluated whenever the code is read.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, sqlx::FromRow)]
pub struct ReferralCode {
    pub code: Uuid,
    pub user_id: Uuid,
    pub expiration_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ReferralCode {
    pub fn new(user_id: Uuid, expiration_date: DateTime<Utc>) -> Self {
        ReferralCode {
            code: Uuid::new_v4(),
            user_id,
            expiration_date,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration_date
    }

    /// Active and not yet past its expiration date.
    pub fn is_usable(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_code_is_active() {
        let user_id = Uuid::new_v4();
        let code = ReferralCode::new(user_id, Utc::now() + Duration::hours(1));
        assert!(code.is_active);
        assert_eq!(code.user_id, user_id);
        assert!(code.is_usable());
    }

    #[test]
    fn test_expired_code_still_active() {
        let mut code = ReferralCode::new(Uuid::new_v4(), Utc::now() + Duration::hours(1));
        code.expiration_date = Utc::now() - Duration::minutes(5);
        assert!(code.is_active);
        assert!(code.is_expired());
        assert!(!code.is_usable());
    }

    #[test]
    fn test_expiry_boundary() {
        let code = ReferralCode::new(Uuid::new_v4(), Utc::now() + Duration::hours(1));
        let at = code.expiration_date;
        assert!(!code.is_expired_at(at));
        assert!(code.is_expired_at(at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_inactive_code_not_usable() {
        let mut code = ReferralCode::new(Uuid::new_v4(), Utc::now() + Duration::hours(1));
        code.is_active = false;
        assert!(!code.is_expired());
        assert!(!code.is_usable());
    }
}
