use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::{Result, VidTubeError};

/// Which of the two token families a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,
    /// Token family
    pub typ: TokenKind,
    /// Unique token ID, so two tokens minted in the same second still differ
    pub jti: String,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
}

impl Claims {
    /// Creates claims for an identity expiring `ttl` from now. Fails with
    /// `SystemError` when the expiry does not fit in a timestamp.
    pub fn new(identity_id: &str, typ: TokenKind, ttl: Duration) -> Result<Self> {
        let now = chrono::Utc::now().timestamp().max(0) as usize;
        let exp = usize::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| {
                VidTubeError::SystemError(format!(
                    "{} token lifetime of {}s overflows the expiry timestamp",
                    typ,
                    ttl.as_secs()
                ))
            })?;

        Ok(Self {
            sub: identity_id.to_string(),
            typ,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp,
        })
    }
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub identity_id: String,
}

/// Signing and verification keys for one token family
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and verifies access and refresh tokens. Pure: no storage access.
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl TokenService {
    /// Creates a token service with one secret and lifetime per token family
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: KeyPair::new(access_secret, access_ttl),
            refresh: KeyPair::new(refresh_secret, refresh_ttl),
            validation,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime configured for a token family
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    /// Signs the given claims with the key of their own family
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(claims.typ).encoding)
            .map_err(|e| VidTubeError::SystemError(format!("Failed to generate token: {}", e)))
    }

    fn issue(&self, identity_id: &str, kind: TokenKind) -> Result<String> {
        let claims = Claims::new(identity_id, kind, self.ttl(kind))?;
        self.sign(&claims)
    }

    /// Short-lived, stateless bearer token
    pub fn issue_access_token(&self, identity_id: &str) -> Result<String> {
        self.issue(identity_id, TokenKind::Access)
    }

    /// Long-lived token, only valid while it is the stored current token
    pub fn issue_refresh_token(&self, identity_id: &str) -> Result<String> {
        self.issue(identity_id, TokenKind::Refresh)
    }

    /// Verifies signature, expiry and family. Every failure collapses to
    /// `InvalidToken`; the precise reason is only logged.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<VerifiedToken> {
        let data = decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "expired",
                    ErrorKind::InvalidSignature => "bad signature",
                    ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => "malformed",
                    _ => "rejected",
                };
                log::debug!("{} token verification failed: {} ({})", expected, reason, e);
                VidTubeError::InvalidToken
            })?;

        if data.claims.typ != expected {
            log::debug!(
                "Token kind mismatch: expected {}, got {}",
                expected,
                data.claims.typ
            );
            return Err(VidTubeError::InvalidToken);
        }

        if data.claims.sub.is_empty() {
            log::debug!("{} token carries an empty subject", expected);
            return Err(VidTubeError::InvalidToken);
        }

        Ok(VerifiedToken {
            identity_id: data.claims.sub,
        })
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
