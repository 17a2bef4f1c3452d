use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        CreateReferralCodeDto, FilterReferralDto, ReferralCodeByEmailDto,
        ReferralCodeByEmailResponseDto, ReferralCodeDto,
    },
    error::{ErrorMessage, HttpError},
    extractor::JsonBody,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn referral_handler() -> Router {
    Router::new()
        .route("/referral-code/create", post(create_referral_code))
        .route("/referral-code/delete/:code", delete(delete_referral_code))
        .route("/referral-code/by-email", post(referral_code_by_email))
        .route("/referrals", get(get_referrals))
}

pub async fn create_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    JsonBody(body): JsonBody<CreateReferralCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    let referral_code = app_state
        .referral_service
        .create(user.user.id, body.expiration_date)
        .await?;

    Ok((StatusCode::CREATED, Json(ReferralCodeDto::from_code(&referral_code))))
}

pub async fn delete_referral_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    // A malformed code cannot exist, so it is reported the same as a missing one.
    let code = Uuid::parse_str(&code)
        .map_err(|_| HttpError::not_found(ErrorMessage::ReferralCodeNotFound.to_string()))?;

    app_state
        .referral_service
        .delete(code, user.user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn referral_code_by_email(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<ReferralCodeByEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let owner = app_state
        .account_service
        .get_user_by_email(&body.email)
        .await?;

    let cached = app_state
        .referral_service
        .lookup_for_owner(owner.id)
        .await?;

    Ok(Json(ReferralCodeByEmailResponseDto {
        referral_code: cached.code,
        expiration_date: cached.expiration_date,
    }))
}

pub async fn get_referrals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let referrals = app_state
        .account_service
        .list_referrals(user.user.id)
        .await?;

    Ok(Json(FilterReferralDto::filter_users(&referrals)))
}
