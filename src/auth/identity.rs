use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored user record, as relevant to authentication
#[derive(Debug, Clone)]
pub struct Identity {
    /// Unique identifier, assigned at creation and never changed
    pub id: String,
    /// Lowercased handle
    pub username: String,
    /// Lowercased email address
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    /// Argon2 PHC string, never exposed outward
    pub credential_hash: String,
    /// The single refresh token currently valid for this identity
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Creates a new identity with a fresh id and no active session
    pub fn new(
        username: &str,
        email: &str,
        full_name: String,
        credential_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.trim().to_lowercase(),
            email: email.trim().to_lowercase(),
            full_name,
            avatar_url: None,
            cover_url: None,
            credential_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sanitized copy for handing to callers and downstream handlers
    pub fn view(&self) -> IdentityView {
        IdentityView {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_url: self.cover_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Update the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Identity without credential hash or refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdentity {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
}
