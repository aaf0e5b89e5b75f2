//! HTTP handlers for registration, login, logout, token refresh and password changes

use serde::Deserialize;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::Rejection;

use super::response::{append_cookies, expired_cookie, success, token_cookie};
use super::AppState;
use crate::auth::identity::{IdentityView, NewIdentity};
use crate::auth::session::TokenPair;
use crate::auth::token::TokenKind;
use crate::constants::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::error::VidTubeError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Response carrying both token cookies
fn with_token_cookies(state: &AppState, mut response: Response, tokens: &TokenPair) -> Result<Response, Rejection> {
    let token_service = state.sessions.tokens();
    let cookies = [
        token_cookie(
            ACCESS_TOKEN_COOKIE,
            &tokens.access_token,
            token_service.ttl(TokenKind::Access),
            state.cookie_secure,
        ),
        token_cookie(
            REFRESH_TOKEN_COOKIE,
            &tokens.refresh_token,
            token_service.ttl(TokenKind::Refresh),
            state.cookie_secure,
        ),
    ];
    append_cookies(&mut response, &cookies).map_err(warp::reject::custom)?;
    Ok(response)
}

pub async fn register(state: AppState, request: NewIdentity) -> Result<Response, Rejection> {
    let view = state
        .sessions
        .register(request)
        .await
        .map_err(warp::reject::custom)?;

    Ok(success(StatusCode::CREATED, "User created successfully", view))
}

pub async fn login(state: AppState, request: LoginRequest) -> Result<Response, Rejection> {
    let identifier = non_blank(request.username)
        .or_else(|| non_blank(request.email))
        .ok_or_else(|| {
            warp::reject::custom(VidTubeError::ValidationError(
                "Username or email is required".to_string(),
            ))
        })?;
    let password = request.password.unwrap_or_default();

    let outcome = state
        .sessions
        .login(&identifier, &password)
        .await
        .map_err(warp::reject::custom)?;

    let tokens = outcome.tokens.clone();
    let response = success(StatusCode::OK, "User logged in successfully", outcome);
    with_token_cookies(&state, response, &tokens)
}

pub async fn logout(state: AppState, identity: IdentityView) -> Result<Response, Rejection> {
    state
        .sessions
        .logout(&identity.id)
        .await
        .map_err(warp::reject::custom)?;

    let mut response = success(StatusCode::OK, "User logged out successfully", serde_json::json!({}));
    let cookies = [
        expired_cookie(ACCESS_TOKEN_COOKIE, state.cookie_secure),
        expired_cookie(REFRESH_TOKEN_COOKIE, state.cookie_secure),
    ];
    append_cookies(&mut response, &cookies).map_err(warp::reject::custom)?;
    Ok(response)
}

/// Refresh token comes from the cookie, else from the JSON body
pub async fn refresh(state: AppState, cookie: Option<String>, body: Bytes) -> Result<Response, Rejection> {
    let from_body = || {
        if body.is_empty() {
            return None;
        }
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|request| non_blank(request.refresh_token))
    };

    let presented = non_blank(cookie).or_else(from_body).ok_or_else(|| {
        warp::reject::custom(VidTubeError::Unauthorized("missing refresh token".to_string()))
    })?;

    let tokens = state
        .sessions
        .refresh(&presented)
        .await
        .map_err(warp::reject::custom)?;

    let response = success(StatusCode::OK, "Access token refreshed successfully", tokens.clone());
    with_token_cookies(&state, response, &tokens)
}

pub async fn change_password(
    state: AppState,
    identity: IdentityView,
    request: ChangePasswordRequest,
) -> Result<Response, Rejection> {
    let (old_password, new_password) = match (request.old_password, request.new_password) {
        (Some(old), Some(new)) => (old, new),
        _ => {
            return Err(warp::reject::custom(VidTubeError::ValidationError(
                "All fields are required".to_string(),
            )))
        }
    };

    state
        .sessions
        .change_password(&identity.id, &old_password, &new_password)
        .await
        .map_err(warp::reject::custom)?;

    Ok(success(StatusCode::OK, "Password changed successfully", serde_json::json!({})))
}

pub async fn update_account(
    state: AppState,
    identity: IdentityView,
    request: UpdateAccountRequest,
) -> Result<Response, Rejection> {
    let view = state
        .sessions
        .update_account_details(&identity.id, request.full_name, request.email)
        .await
        .map_err(warp::reject::custom)?;

    Ok(success(StatusCode::OK, "User details updated successfully", view))
}

pub async fn current_user(identity: IdentityView) -> Result<Response, Rejection> {
    Ok(success(StatusCode::OK, "User fetched successfully", identity))
}
