//! Security utilities

pub mod headers;
pub mod timing;

pub use headers::security_headers;
pub use timing::{add_auth_delay, constant_time_eq, AuthTimer};
