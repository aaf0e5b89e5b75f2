use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use warp::http::header::SET_COOKIE;
use warp::http::StatusCode;
use warp::{Filter, Reply};

use vidtube::auth::{AuthGate, CredentialHasher, SessionManager, TokenService};
use vidtube::handlers::{routes, AppState};
use vidtube::storage::create_memory_credential_store;

fn state() -> AppState {
    let store = create_memory_credential_store();
    let tokens = Arc::new(TokenService::new(
        "k9Qv2_Lm8Zx4-Rt7Wb1Yp6Hs3Nd0Fj5Gc",
        "Zp4_Tn7Wq1-Bx8Kd3Rm6Yv0Hc5Js2Lf9G",
        Duration::from_secs(900),
        Duration::from_secs(86_400),
    ));
    let hasher = CredentialHasher::with_cost(1024, 1).unwrap();
    AppState {
        sessions: Arc::new(
            SessionManager::new(store.clone(), tokens.clone(), hasher)
                .with_min_failure_duration(Duration::ZERO),
        ),
        gate: Arc::new(AuthGate::new(tokens, store)),
        cookie_secure: false,
    }
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body should be JSON")
}

fn set_cookies(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

async fn register_and_login<F>(filter: &F) -> Value
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/register")
        .json(&json!({
            "fullName": "Http User",
            "email": "http@example.com",
            "username": "httpuser",
            "password": "correctpw"
        }))
        .reply(filter)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .json(&json!({ "username": "httpuser", "password": "correctpw" }))
        .reply(filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response.body())
}

#[tokio::test]
async fn test_healthcheck() {
    let filter = routes(state());

    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/healthcheck")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    let body = body_json(response.body());
    assert_eq!(body["data"]["status"], "OK");
}

#[tokio::test]
async fn test_login_sets_cookies_and_envelope() {
    let filter = routes(state());
    let _ = register_and_login(&filter).await;

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .json(&json!({ "email": "http@example.com", "password": "correctpw" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=") && c.contains("HttpOnly")));

    let body = body_json(response.body());
    assert_eq!(body["success"], true);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["data"]["user"]["username"], "httpuser");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["user"].get("refreshToken").is_none());
    assert!(body["data"]["accessToken"].as_str().is_some());
    assert!(body["data"]["refreshToken"].as_str().is_some());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let filter = routes(state());
    let _ = register_and_login(&filter).await;

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .json(&json!({ "username": "httpuser", "password": "wrongpass" }))
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let body = body_json(response.body());
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_current_user_requires_token() {
    let filter = routes(state());
    let login = register_and_login(&filter).await;
    let access = login["data"]["accessToken"].as_str().unwrap().to_string();

    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/users/current-user")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/users/current-user")
        .header("authorization", format!("Bearer {}", access))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.body())["data"]["username"], "httpuser");

    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/users/current-user")
        .header("cookie", format!("accessToken={}", access))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rotation_over_http() {
    let filter = routes(state());
    let login = register_and_login(&filter).await;
    let first = login["data"]["refreshToken"].as_str().unwrap().to_string();

    // Presented in the body
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/refresh-token")
        .json(&json!({ "refreshToken": first }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookies(&response).len(), 2);
    let second = body_json(response.body())["data"]["refreshToken"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(first, second);

    // Replaying the old one fails
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/refresh-token")
        .header("cookie", format!("refreshToken={}", first))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response.body())["message"],
        "Refresh token is expired or used"
    );

    // The new one still works, presented as a cookie
    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/refresh-token")
        .header("cookie", format!("refreshToken={}", second))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token() {
    let filter = routes(state());

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/refresh-token")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies_and_session() {
    let filter = routes(state());
    let login = register_and_login(&filter).await;
    let access = login["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh = login["data"]["refreshToken"].as_str().unwrap().to_string();

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/logout")
        .header("authorization", format!("Bearer {}", access))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/refresh-token")
        .json(&json!({ "refreshToken": refresh }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_over_http() {
    let filter = routes(state());
    let login = register_and_login(&filter).await;
    let access = login["data"]["accessToken"].as_str().unwrap().to_string();

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/change-password")
        .header("authorization", format!("Bearer {}", access))
        .json(&json!({ "oldPassword": "wrongpass", "newPassword": "brandnewpw" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/change-password")
        .header("authorization", format!("Bearer {}", access))
        .json(&json!({ "oldPassword": "correctpw", "newPassword": "brandnewpw" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .json(&json!({ "username": "httpuser", "password": "brandnewpw" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_register_and_bad_body() {
    let filter = routes(state());
    let _ = register_and_login(&filter).await;

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/register")
        .json(&json!({
            "fullName": "Other",
            "email": "other@example.com",
            "username": "HTTPUSER",
            "password": "correctpw"
        }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route() {
    let filter = routes(state());

    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/nope")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_json_content_type_is_a_client_error() {
    let filter = routes(state());
    let _ = register_and_login(&filter).await;

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .header("content-type", "text/plain")
        .body(r#"{"username":"httpuser","password":"correctpw"}"#)
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_json(response.body());
    assert_eq!(body["kind"], "validation_error");
    assert_eq!(body["success"], false);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_update_account_over_http() {
    let filter = routes(state());
    let login = register_and_login(&filter).await;
    let access = login["data"]["accessToken"].as_str().unwrap().to_string();

    let response = warp::test::request()
        .method("PATCH")
        .path("/api/v1/users/update-account")
        .json(&json!({ "fullName": "Renamed", "email": "renamed@example.com" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = warp::test::request()
        .method("PATCH")
        .path("/api/v1/users/update-account")
        .header("authorization", format!("Bearer {}", access))
        .json(&json!({ "fullName": "Renamed", "email": "renamed@example.com" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.body());
    assert_eq!(body["data"]["email"], "renamed@example.com");
    assert_eq!(body["data"]["fullName"], "Renamed");

    let response = warp::test::request()
        .method("POST")
        .path("/api/v1/users/login")
        .json(&json!({ "email": "renamed@example.com", "password": "correctpw" }))
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
