use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap_or_default())
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,
    InvalidToken,
    WrongCredentials,
    EmailExist,
    UsernameExist,
    UserNoLongerExist,
    TokenNotProvided,
    ReferralCodeNotFound,
    InvalidReferralCode,
    ReferralCodeExpired,
    ExpirationInPast,
    NoActiveReferralCode,
    ReferralCodeNotCached,
    UnknownEmail,
    EmailInvalid,
    EmailCheckFailed,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Password cannot be empty",
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                return write!(
                    f,
                    "Password must not be more than {} characters",
                    max_length
                );
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format",
            ErrorMessage::HashingError => "Error while hashing password",
            ErrorMessage::InvalidToken => "Authentication token is invalid or expired",
            ErrorMessage::WrongCredentials => "Invalid credentials",
            ErrorMessage::EmailExist => "A user with this email already exists",
            ErrorMessage::UsernameExist => "A user with this username already exists",
            ErrorMessage::UserNoLongerExist => "User belonging to this token no longer exists",
            ErrorMessage::TokenNotProvided => "You are not logged in, please provide a token",
            ErrorMessage::ReferralCodeNotFound => "Referral code not found",
            ErrorMessage::InvalidReferralCode => "Invalid referral code.",
            ErrorMessage::ReferralCodeExpired => "Referral code has expired.",
            ErrorMessage::ExpirationInPast => "Expiration date cannot be in the past.",
            ErrorMessage::NoActiveReferralCode => "No active referral code found or code has expired",
            ErrorMessage::ReferralCodeNotCached => "Referral code not found in cache.",
            ErrorMessage::UnknownEmail => "User with this email does not exist.",
            ErrorMessage::EmailInvalid => "The email address is invalid or cannot be used.",
            ErrorMessage::EmailCheckFailed => "Error checking email validity.",
        };

        f.write_str(message)
    }
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status: "fail".to_string(),
            error: self.message.clone(),
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_display() {
        assert_eq!(ErrorMessage::WrongCredentials.to_string(), "Invalid credentials");
        assert_eq!(
            ErrorMessage::ExceededMaxPasswordLength(64).to_string(),
            "Password must not be more than 64 characters"
        );
        assert_eq!(
            format!("{}", ErrorMessage::NoActiveReferralCode),
            "No active referral code found or code has expired"
        );
    }

    #[test]
    fn test_http_error_response_status() {
        let response = HttpError::bad_request("bad input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
