use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    dtos::{
        AccessTokenResponseDto, LoginUserDto, RefreshTokenDto, RegisterUserDto,
        RegisterUserWithReferralDto, Response, TokenPairResponseDto,
    },
    error::HttpError,
    extractor::JsonBody,
    utils::token::{self, TokenType},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/register-with-referral", post(register_with_referral))
        .route("/login", post(login))
        .route("/token", post(login))
        .route("/token/refresh", post(refresh_token))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .account_service
        .register(&body.username, &body.email, &body.password)
        .await?;

    let response = Response {
        status: "success",
        message: "User registered successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn register_with_referral(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterUserWithReferralDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .account_service
        .register_with_referral(
            &body.username,
            &body.email,
            &body.password,
            body.referral_code.as_deref(),
        )
        .await?;

    let response = Response {
        status: "success",
        message: "User registered successfully with referral code".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .account_service
        .authenticate(&body.username, &body.password)
        .await?;

    let access = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
        TokenType::Access,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let refresh = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_refresh_maxage,
        TokenType::Refresh,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build(("token", access.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Failed to build session cookie"))?,
    );

    let mut response = Json(TokenPairResponseDto {
        status: "success".to_string(),
        refresh,
        access,
    })
    .into_response();
    response.headers_mut().extend(headers);

    tracing::info!("User {} logged in", user.username);

    Ok(response)
}

pub async fn refresh_token(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<RefreshTokenDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user_id = token::decode_token(
        body.refresh,
        app_state.env.jwt_secret.as_bytes(),
        TokenType::Refresh,
    )?;

    let access = token::create_token(
        &user_id,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
        TokenType::Access,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(AccessTokenResponseDto {
        status: "success".to_string(),
        access,
    }))
}
