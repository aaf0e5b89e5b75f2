//! Session orchestration: registration, login, logout, refresh rotation,
//! password changes and account detail updates.
//!
//! One identity has at most one valid refresh token at a time: the value
//! stored on the identity. Login overwrites it, logout clears it, and refresh
//! replaces it through a compare-and-swap so that a token can be redeemed at
//! most once, even under concurrent presentation.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::identity::{Identity, IdentityView, NewIdentity};
use crate::auth::password::CredentialHasher;
use crate::auth::token::{TokenKind, TokenService};
use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::{Result, VidTubeError};
use crate::security::{constant_time_eq, AuthTimer};
use crate::security_logger::{log_security_event, SecurityEvent};
use crate::storage::SharedCredentialStore;

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user: IdentityView,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn required(field: Option<String>, name: &str) -> Result<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VidTubeError::ValidationError(format!("{} is required", name))),
    }
}

fn check_password_length(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(VidTubeError::ValidationError(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub struct SessionManager {
    store: SharedCredentialStore,
    tokens: Arc<TokenService>,
    hasher: CredentialHasher,
    min_failure_duration: Duration,
}

impl SessionManager {
    pub fn new(store: SharedCredentialStore, tokens: Arc<TokenService>, hasher: CredentialHasher) -> Self {
        Self {
            store,
            tokens,
            hasher,
            min_failure_duration: Duration::ZERO,
        }
    }

    /// Pad failed logins to at least `duration`
    pub fn with_min_failure_duration(mut self, duration: Duration) -> Self {
        self.min_failure_duration = duration;
        self
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create a new identity. No session is started.
    pub async fn register(&self, request: NewIdentity) -> Result<IdentityView> {
        let full_name = required(request.full_name, "Full name")?;
        let email = required(request.email, "Email")?;
        let username = required(request.username, "Username")?;
        let password = required(request.password, "Password")?;

        if !email.contains('@') {
            return Err(VidTubeError::ValidationError("Email is invalid".to_string()));
        }
        if username.contains('@') {
            return Err(VidTubeError::ValidationError("Username must not contain '@'".to_string()));
        }
        check_password_length(&password)?;

        let hash = self.hasher.hash_blocking(password).await?;
        let mut identity = Identity::new(&username, &email, full_name.trim().to_string(), hash);
        identity.avatar_url = request.avatar_url.filter(|url| !url.trim().is_empty());
        identity.cover_url = request.cover_url.filter(|url| !url.trim().is_empty());

        let view = identity.view();
        self.store.insert(identity).await?;

        log_security_event(SecurityEvent::Registered {
            identity_id: view.id.clone(),
        })
        .await;
        Ok(view)
    }

    /// Verify credentials, issue both tokens and make the new refresh token
    /// the identity's only valid one.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome> {
        if identifier.trim().is_empty() {
            return Err(VidTubeError::ValidationError("Username or email is required".to_string()));
        }
        if password.is_empty() {
            return Err(VidTubeError::ValidationError("Password is required".to_string()));
        }

        let timer = AuthTimer::new(self.min_failure_duration);

        let identity = match self.store.find_by_username_or_email(identifier).await? {
            Some(identity) => identity,
            None => {
                log_security_event(SecurityEvent::LoginFailed {
                    identifier: identifier.to_string(),
                    reason: "unknown identity".to_string(),
                })
                .await;
                timer.wait().await;
                return Err(VidTubeError::NotFound("User".to_string()));
            }
        };

        let valid = self
            .hasher
            .verify_blocking(identity.credential_hash.clone(), password.to_string())
            .await?;
        if !valid {
            log_security_event(SecurityEvent::LoginFailed {
                identifier: identifier.to_string(),
                reason: "invalid credentials".to_string(),
            })
            .await;
            timer.wait().await;
            return Err(VidTubeError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&identity.id)?;
        // Last writer wins: a concurrent login for the same identity simply
        // supersedes this session.
        self.store
            .update_refresh_token(&identity.id, Some(tokens.refresh_token.clone()))
            .await?;

        log_security_event(SecurityEvent::LoginSucceeded {
            identity_id: identity.id.clone(),
        })
        .await;

        Ok(LoginOutcome {
            user: identity.view(),
            tokens,
        })
    }

    /// Clear the stored refresh token. Idempotent.
    pub async fn logout(&self, identity_id: &str) -> Result<()> {
        match self.store.update_refresh_token(identity_id, None).await {
            Ok(()) | Err(VidTubeError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        log_security_event(SecurityEvent::LoggedOut {
            identity_id: identity_id.to_string(),
        })
        .await;
        Ok(())
    }

    /// Redeem a refresh token for a new pair. The presented token is dead
    /// afterwards whether or not the caller receives the response.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair> {
        let verified = match self.tokens.verify(presented, TokenKind::Refresh) {
            Ok(verified) => verified,
            Err(e) => {
                log_security_event(SecurityEvent::TokenValidationFailed {
                    kind: TokenKind::Refresh.to_string(),
                    reason: "signature, expiry or kind check failed".to_string(),
                })
                .await;
                return Err(e);
            }
        };

        let identity = match self.store.find_by_id(&verified.identity_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return Err(VidTubeError::InvalidToken),
            Err(e) => {
                log::error!("Identity lookup failed during refresh: {}", e);
                return Err(VidTubeError::InvalidToken);
            }
        };

        let current_matches = identity
            .refresh_token
            .as_deref()
            .map(|current| constant_time_eq(current, presented))
            .unwrap_or(false);

        if !current_matches {
            log_security_event(SecurityEvent::RefreshTokenReuse {
                identity_id: identity.id.clone(),
            })
            .await;
            return Err(VidTubeError::TokenReuse);
        }

        let tokens = self.issue_pair(&identity.id)?;
        let swapped = self
            .store
            .swap_refresh_token(&identity.id, presented, tokens.refresh_token.clone())
            .await?;

        if !swapped {
            // Another request redeemed the same token between our read and write
            log_security_event(SecurityEvent::RefreshTokenReuse {
                identity_id: identity.id.clone(),
            })
            .await;
            return Err(VidTubeError::TokenReuse);
        }

        log_security_event(SecurityEvent::TokenRotated {
            identity_id: identity.id,
        })
        .await;
        Ok(tokens)
    }

    /// Replace the credential hash. The current refresh token stays valid.
    pub async fn change_password(&self, identity_id: &str, old_password: &str, new_password: &str) -> Result<()> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(VidTubeError::ValidationError("All fields are required".to_string()));
        }

        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or_else(|| VidTubeError::NotFound("User".to_string()))?;

        let valid = self
            .hasher
            .verify_blocking(identity.credential_hash.clone(), old_password.to_string())
            .await?;
        if !valid {
            return Err(VidTubeError::InvalidCredentials);
        }

        if old_password == new_password {
            return Err(VidTubeError::ValidationError(
                "New password should be different from old password".to_string(),
            ));
        }
        check_password_length(new_password)?;

        let hash = self.hasher.hash_blocking(new_password.to_string()).await?;
        self.store.update_credential_hash(identity_id, hash).await?;

        log_security_event(SecurityEvent::PasswordChanged {
            identity_id: identity_id.to_string(),
        })
        .await;
        Ok(())
    }

    /// Replace full name and email. Both are required; the email is also a
    /// login identifier, so it goes through the same uniqueness check as
    /// registration. Sessions are untouched.
    pub async fn update_account_details(
        &self,
        identity_id: &str,
        full_name: Option<String>,
        email: Option<String>,
    ) -> Result<IdentityView> {
        let (full_name, email) = match (full_name, email) {
            (Some(name), Some(email)) if !name.trim().is_empty() && !email.trim().is_empty() => {
                (name, email)
            }
            _ => {
                return Err(VidTubeError::ValidationError(
                    "All fields are required".to_string(),
                ))
            }
        };
        if !email.contains('@') {
            return Err(VidTubeError::ValidationError("Email is invalid".to_string()));
        }

        let identity = self
            .store
            .update_profile(identity_id, full_name.trim().to_string(), email)
            .await?;

        log_security_event(SecurityEvent::AccountUpdated {
            identity_id: identity_id.to_string(),
        })
        .await;
        Ok(identity.view())
    }

    /// Sanitized view of an identity
    pub async fn current_identity(&self, identity_id: &str) -> Result<IdentityView> {
        self.store
            .find_by_id(identity_id)
            .await?
            .map(|identity| identity.view())
            .ok_or_else(|| VidTubeError::NotFound("User".to_string()))
    }

    fn issue_pair(&self, identity_id: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.tokens.issue_access_token(identity_id)?,
            refresh_token: self.tokens.issue_refresh_token(identity_id)?,
        })
    }
}
