use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::referralmodel::ReferralCode;

/// Only the expiration date is client-settable; code, owner and active flag
/// are assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReferralCodeDto {
    pub expiration_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralCodeDto {
    pub code: Uuid,
    pub expiration_date: DateTime<Utc>,
    pub is_active: bool,
    pub user: Uuid,
}

impl ReferralCodeDto {
    pub fn from_code(referral_code: &ReferralCode) -> Self {
        ReferralCodeDto {
            code: referral_code.code,
            expiration_date: referral_code.expiration_date,
            is_active: referral_code.is_active,
            user: referral_code.user_id,
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ReferralCodeByEmailDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralCodeByEmailResponseDto {
    pub referral_code: Uuid,
    pub expiration_date: DateTime<Utc>,
}
