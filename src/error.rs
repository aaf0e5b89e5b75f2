use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum VidTubeError {
    // Input errors
    ValidationError(String),
    Conflict(String),

    // Credential errors
    InvalidCredentials,
    NotFound(String),

    // Token errors
    Unauthorized(String),
    InvalidToken,
    TokenReuse,

    // System errors
    SystemError(String),

    // Configuration errors
    ConfigError(String),
}

impl VidTubeError {
    /// Stable machine-readable kind, safe to hand to clients
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidToken => "invalid_token",
            Self::TokenReuse => "token_reuse",
            Self::SystemError(_) => "system_error",
            Self::ConfigError(_) => "config_error",
        }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ValidationError(_) => 400,
            Self::InvalidCredentials
            | Self::Unauthorized(_)
            | Self::InvalidToken
            | Self::TokenReuse => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::SystemError(_) | Self::ConfigError(_) => 500,
        }
    }

    /// Message shown to clients. Internal failures never leak their detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::SystemError(_) | Self::ConfigError(_) => {
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for VidTubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationError(msg) => write!(f, "{}", msg),
            Self::Conflict(msg) => write!(f, "{}", msg),
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::NotFound(what) => write!(f, "{} does not exist", what),
            Self::Unauthorized(msg) => write!(f, "Unauthorized request: {}", msg),
            Self::InvalidToken => write!(f, "Invalid or expired token"),
            Self::TokenReuse => write!(f, "Refresh token is expired or used"),
            Self::SystemError(msg) => write!(f, "System error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for VidTubeError {}

// Lets handlers and filters reject with a typed error that the recovery
// handler turns into a structured response
impl warp::reject::Reject for VidTubeError {}

// Generic result type for VidTube
pub type Result<T> = std::result::Result<T, VidTubeError>;
