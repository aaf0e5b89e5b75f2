//! Security headers for HTTP responses
//!
//! Every API response carries these. Token-bearing responses must also never
//! be cached, hence `Cache-Control: no-store`.

use warp::http::header::{HeaderMap, HeaderName, HeaderValue};

/// Strict Content Security Policy for a JSON-only API
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none';";

const PERMISSIONS_POLICY: &str =
    "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()";

/// Headers attached to every response
pub fn security_headers() -> HeaderMap {
    let pairs: [(&'static str, &'static str); 6] = [
        ("x-frame-options", "DENY"),
        ("x-content-type-options", "nosniff"),
        ("referrer-policy", "no-referrer"),
        ("content-security-policy", API_CSP),
        ("cache-control", "no-store"),
        ("permissions-policy", PERMISSIONS_POLICY),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}
