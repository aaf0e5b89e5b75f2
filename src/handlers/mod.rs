//! Request handlers and route table

pub mod auth;
pub mod health;
pub mod response;

use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

use crate::auth::gate::{with_identity, AuthGate};
use crate::auth::session::SessionManager;
use crate::constants::{API_PREFIX, API_VERSION, MAX_JSON_BODY_BYTES, REFRESH_TOKEN_COOKIE};
use crate::security::security_headers;

pub use response::handle_rejection;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub gate: Arc<AuthGate>,
    pub cookie_secure: bool,
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_JSON_BODY_BYTES).and(warp::body::json())
}

/// All API routes with rejection recovery, security headers and request logging
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api = warp::path(API_PREFIX).and(warp::path(API_VERSION));
    let users = api.and(warp::path("users"));

    let healthcheck = api
        .and(warp::path("healthcheck"))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health::healthcheck);

    let register = users
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(auth::register);

    let login = users
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(auth::login);

    let refresh = users
        .and(warp::path("refresh-token"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::cookie::optional(REFRESH_TOKEN_COOKIE))
        .and(warp::body::bytes())
        .and_then(auth::refresh);

    let logout = users
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_identity(state.gate.clone()))
        .and_then(auth::logout);

    let change_password = users
        .and(warp::path("change-password"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(with_identity(state.gate.clone()))
        .and(json_body())
        .and_then(auth::change_password);

    let update_account = users
        .and(warp::path("update-account"))
        .and(warp::path::end())
        .and(warp::patch())
        .and(with_state(state.clone()))
        .and(with_identity(state.gate.clone()))
        .and(json_body())
        .and_then(auth::update_account);

    let current_user = users
        .and(warp::path("current-user"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_identity(state.gate.clone()))
        .and_then(auth::current_user);

    healthcheck
        .or(register)
        .or(login)
        .or(refresh)
        .or(logout)
        .or(change_password)
        .or(update_account)
        .or(current_user)
        .recover(handle_rejection)
        .with(warp::reply::with::headers(security_headers()))
        .with(warp::log("vidtube::http"))
}
