use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::usermodel::User;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 1, message = "Username is required"),
        length(max = 150, message = "Username must not be more than 150 characters")
    )]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserWithReferralDto {
    #[validate(
        length(min = 1, message = "Username is required"),
        length(max = 150, message = "Username must not be more than 150 characters")
    )]
    pub username: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[serde(default)]
    pub referral_code: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RefreshTokenDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponseDto {
    pub status: String,
    pub refresh: String,
    pub access: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponseDto {
    pub status: String,
    pub access: String,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

/// Public view of a referred user.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterReferralDto {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl FilterReferralDto {
    pub fn filter_user(user: &User) -> Self {
        FilterReferralDto {
            id: user.id.to_string(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterReferralDto> {
        users.iter().map(FilterReferralDto::filter_user).collect()
    }
}
