//! Server configuration module
//! Handles token secrets, lifetimes and transport settings for the auth server

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB,
    DEFAULT_AUTH_MIN_DURATION_MS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REFRESH_TOKEN_TTL_SECS,
    MAX_TOKEN_TTL_SECS,
};
use crate::error::{Result, VidTubeError};
use std::env;
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Secret used to sign access tokens
    pub access_token_secret: String,
    /// Secret used to sign refresh tokens (must differ from the access secret)
    pub refresh_token_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Mark token cookies as Secure (HTTPS only)
    pub cookie_secure: bool,
    /// Minimum wall time spent on a failed login
    pub auth_min_duration: Duration,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    /// TLS configuration
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    /// Enable TLS
    pub enable_tls: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        panic!("ServerConfig::default() is not allowed for security reasons. Use ServerConfig::from_env() instead.");
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            access_token_secret: "test-access-key-only-for-unit-tests-never-use-in-production".to_string(),
            refresh_token_secret: "test-refresh-key-only-for-unit-tests-never-use-in-production".to_string(),
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(3600),
            cookie_secure: false,
            auth_min_duration: Duration::ZERO,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            tls_cert_path: None,
            tls_key_path: None,
            enable_tls: false,
        }
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str, secret_type: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(VidTubeError::ConfigError(format!(
                "{} secret must be at least 32 characters long",
                secret_type
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "changeme",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.to_lowercase().contains(pattern) {
                return Err(VidTubeError::ConfigError(format!(
                    "{} secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    secret_type, pattern
                )));
            }
        }

        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(VidTubeError::ConfigError(format!(
                "{} secret should contain mixed characters (letters, numbers, symbols) for security",
                secret_type
            )));
        }

        Ok(())
    }

    /// Access and refresh tokens must never share a signing key
    fn validate_secrets_are_different(access_secret: &str, refresh_secret: &str) -> Result<()> {
        if access_secret == refresh_secret {
            return Err(VidTubeError::ConfigError(
                "Access and refresh token secrets must be different. A shared secret lets a leaked access key forge refresh tokens.".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_lifetimes(access_ttl: Duration, refresh_ttl: Duration) -> Result<()> {
        if access_ttl.is_zero() || refresh_ttl.is_zero() {
            return Err(VidTubeError::ConfigError(
                "Token lifetimes must be greater than zero".to_string(),
            ));
        }
        let max = Duration::from_secs(MAX_TOKEN_TTL_SECS);
        if access_ttl > max || refresh_ttl > max {
            return Err(VidTubeError::ConfigError(format!(
                "Token lifetimes must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if access_ttl >= refresh_ttl {
            return Err(VidTubeError::ConfigError(
                "Access token lifetime must be shorter than refresh token lifetime".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = env::var("VIDTUBE_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env_parse("VIDTUBE_PORT", DEFAULT_PORT);

        let access_token_secret = env::var("VIDTUBE_ACCESS_TOKEN_SECRET")
            .or_else(|_| env::var("ACCESS_TOKEN_SECRET"))
            .map_err(|_| {
                VidTubeError::ConfigError(
                    "ACCESS_TOKEN_SECRET environment variable is required. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;

        let refresh_token_secret = env::var("VIDTUBE_REFRESH_TOKEN_SECRET")
            .or_else(|_| env::var("REFRESH_TOKEN_SECRET"))
            .map_err(|_| {
                VidTubeError::ConfigError(
                    "REFRESH_TOKEN_SECRET environment variable is required. \
                     Generate one with: openssl rand -base64 32 \
                     NOTE: it must be different from ACCESS_TOKEN_SECRET."
                        .to_string(),
                )
            })?;

        let access_token_ttl = Duration::from_secs(env_parse(
            "VIDTUBE_ACCESS_TOKEN_TTL_SECS",
            DEFAULT_ACCESS_TOKEN_TTL_SECS,
        ));
        let refresh_token_ttl = Duration::from_secs(env_parse(
            "VIDTUBE_REFRESH_TOKEN_TTL_SECS",
            DEFAULT_REFRESH_TOKEN_TTL_SECS,
        ));

        let cookie_secure = env_flag("VIDTUBE_COOKIE_SECURE", true);
        let auth_min_duration = Duration::from_millis(env_parse(
            "VIDTUBE_AUTH_MIN_DURATION_MS",
            DEFAULT_AUTH_MIN_DURATION_MS,
        ));
        let argon2_memory_kib = env_parse("VIDTUBE_ARGON2_MEMORY_KIB", DEFAULT_ARGON2_MEMORY_KIB);
        let argon2_iterations = env_parse("VIDTUBE_ARGON2_ITERATIONS", DEFAULT_ARGON2_ITERATIONS);

        // TLS configuration
        let enable_tls = env_flag("VIDTUBE_ENABLE_TLS", false);
        let tls_cert_path = env::var("VIDTUBE_TLS_CERT_PATH").ok();
        let tls_key_path = env::var("VIDTUBE_TLS_KEY_PATH").ok();

        if enable_tls {
            match (&tls_cert_path, &tls_key_path) {
                (Some(cert_path), Some(key_path)) => {
                    if !std::path::Path::new(cert_path).exists() {
                        return Err(VidTubeError::ConfigError(format!(
                            "TLS certificate file does not exist: {}",
                            cert_path
                        )));
                    }
                    if !std::path::Path::new(key_path).exists() {
                        return Err(VidTubeError::ConfigError(format!(
                            "TLS private key file does not exist: {}",
                            key_path
                        )));
                    }
                }
                _ => {
                    return Err(VidTubeError::ConfigError(
                        "TLS is enabled but VIDTUBE_TLS_CERT_PATH or VIDTUBE_TLS_KEY_PATH is not set".to_string(),
                    ));
                }
            }
        }

        Self::validate_secret(&access_token_secret, "Access token")?;
        Self::validate_secret(&refresh_token_secret, "Refresh token")?;
        Self::validate_secrets_are_different(&access_token_secret, &refresh_token_secret)?;
        Self::validate_lifetimes(access_token_ttl, refresh_token_ttl)?;

        Ok(Self {
            host,
            port,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl,
            refresh_token_ttl,
            cookie_secure,
            auth_min_duration,
            argon2_memory_kib,
            argon2_iterations,
            tls_cert_path,
            tls_key_path,
            enable_tls,
        })
    }
}
