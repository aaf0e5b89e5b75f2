//! Response envelopes, token cookies and rejection recovery

use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use crate::error::{Result, VidTubeError};

/// Success envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

/// Failure envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub status_code: u16,
    pub kind: &'static str,
    pub message: String,
    pub success: bool,
    pub data: Option<()>,
}

/// Build a JSON success response
pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let body = ApiResponse {
        status_code: status.as_u16(),
        data,
        message: message.to_string(),
        success: true,
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Build a JSON failure response
pub fn failure(status: StatusCode, kind: &'static str, message: String) -> Response {
    let body = ApiErrorBody {
        status_code: status.as_u16(),
        kind,
        message,
        success: false,
        data: None,
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// `Set-Cookie` value carrying a token
pub fn token_cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        name,
        value,
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes a token cookie
pub fn expired_cookie(name: &str, secure: bool) -> String {
    token_cookie(name, "", Duration::ZERO, secure)
}

/// Append several `Set-Cookie` headers (insert would overwrite)
pub fn append_cookies(response: &mut Response, cookies: &[String]) -> Result<()> {
    for cookie in cookies {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| VidTubeError::SystemError(format!("Invalid cookie value: {}", e)))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(())
}

/// Turn any rejection into the failure envelope
pub async fn handle_rejection(err: Rejection) -> std::result::Result<Response, Infallible> {
    let response = if let Some(e) = err.find::<VidTubeError>() {
        if e.status_code() >= 500 {
            log::error!("Request failed: {}", e);
        }
        let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        failure(status, e.kind(), e.public_message())
    } else if err.is_not_found() {
        failure(StatusCode::NOT_FOUND, "not_found", "Route not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        log::debug!("Rejected request body: {}", e);
        failure(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Request body is not valid JSON for this endpoint".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        failure(
            StatusCode::PAYLOAD_TOO_LARGE,
            "validation_error",
            "Request body is too large".to_string(),
        )
    } else if let Some(e) = err.find::<warp::reject::UnsupportedMediaType>() {
        log::debug!("Rejected request: {}", e);
        failure(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "validation_error",
            "Request body must be sent as application/json".to_string(),
        )
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        failure(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("Missing request header '{}'", e.name()),
        )
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        failure(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("Invalid request header '{}'", e.name()),
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        failure(
            StatusCode::LENGTH_REQUIRED,
            "validation_error",
            "Content-Length header is required".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        failure(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "Method not allowed".to_string(),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "system_error",
            "Something went wrong".to_string(),
        )
    };

    Ok(response)
}
