//! Request authorization gate
//!
//! Resolves the caller's identity from an access token and hands it to the
//! downstream handler as a typed value. Never mutates stored state.

use std::sync::Arc;
use warp::{Filter, Rejection};

use crate::auth::identity::IdentityView;
use crate::auth::token::{extract_bearer_token, TokenKind, TokenService};
use crate::constants::{ACCESS_TOKEN_COOKIE, MAX_TOKEN_LENGTH};
use crate::error::{Result, VidTubeError};
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::storage::SharedCredentialStore;

pub struct AuthGate {
    tokens: Arc<TokenService>,
    store: SharedCredentialStore,
}

/// Pick the access token from the cookie first, then the Authorization header
pub fn select_token(cookie: Option<&str>, authorization: Option<&str>) -> Option<String> {
    let from_cookie = cookie
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    from_cookie.or_else(|| authorization.and_then(extract_bearer_token))
}

async fn reject(reason: &str) -> VidTubeError {
    log_security_event(SecurityEvent::UnauthorizedAccess {
        reason: reason.to_string(),
    })
    .await;
    VidTubeError::Unauthorized(reason.to_string())
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, store: SharedCredentialStore) -> Self {
        Self { tokens, store }
    }

    /// Authenticate a request from its cookie and Authorization header values
    pub async fn authenticate(&self, cookie: Option<&str>, authorization: Option<&str>) -> Result<IdentityView> {
        let token = match select_token(cookie, authorization) {
            Some(token) => token,
            None => return Err(reject("missing access token").await),
        };

        if token.len() > MAX_TOKEN_LENGTH || token.chars().any(|c| c.is_control()) {
            return Err(reject("malformed access token").await);
        }

        let verified = match self.tokens.verify(&token, TokenKind::Access) {
            Ok(verified) => verified,
            Err(_) => {
                log_security_event(SecurityEvent::TokenValidationFailed {
                    kind: TokenKind::Access.to_string(),
                    reason: "signature, expiry or kind check failed".to_string(),
                })
                .await;
                return Err(reject("invalid access token").await);
            }
        };

        match self.store.find_by_id(&verified.identity_id).await {
            Ok(Some(identity)) => Ok(identity.view()),
            Ok(None) => Err(reject("invalid access token").await),
            Err(e) => {
                log::error!("Identity lookup failed during authentication: {}", e);
                Err(reject("identity could not be resolved").await)
            }
        }
    }
}

/// Warp filter yielding the authenticated identity, or rejecting with
/// `VidTubeError::Unauthorized`
pub fn with_identity(gate: Arc<AuthGate>) -> impl Filter<Extract = (IdentityView,), Error = Rejection> + Clone {
    warp::cookie::optional(ACCESS_TOKEN_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .and_then(move |cookie: Option<String>, authorization: Option<String>| {
            let gate = gate.clone();
            async move {
                gate.authenticate(cookie.as_deref(), authorization.as_deref())
                    .await
                    .map_err(warp::reject::custom)
            }
        })
}
