use warp::http::StatusCode;
use warp::reply::Response;
use warp::Rejection;

use super::response::success;

pub async fn healthcheck() -> Result<Response, Rejection> {
    Ok(success(
        StatusCode::OK,
        "Server is healthy and running",
        serde_json::json!({ "status": "OK" }),
    ))
}
