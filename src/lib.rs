//! VidTube - authentication and session core for a video-sharing backend
//!
//! This library provides credential verification, access/refresh token
//! issuance with single-use rotation, logout revocation, and the request
//! gate that every protected endpoint sits behind.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod security;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
pub use error::{Result, VidTubeError};
