//! Abstract storage interface for pluggable credential backends
//!
//! Every method is a single-record atomic operation. Callers never
//! read-then-write to rotate a refresh token; they go through
//! `swap_refresh_token`, which a document database would express as one
//! conditional update.

use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::identity::Identity;
use crate::error::Result;

/// Credential storage interface
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new identity. Fails with `Conflict` if the username or email is taken.
    async fn insert(&self, identity: Identity) -> Result<()>;

    /// Look an identity up by username or email (case-insensitive)
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<Identity>>;

    /// Look an identity up by id
    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>>;

    /// Unconditionally set or clear the current refresh token.
    /// Fails with `NotFound` if the identity does not exist.
    async fn update_refresh_token(&self, id: &str, token: Option<String>) -> Result<()>;

    /// Replace the current refresh token only if it still equals `expected`.
    /// Returns whether the swap happened.
    async fn swap_refresh_token(&self, id: &str, expected: &str, replacement: String) -> Result<bool>;

    /// Replace full name and email. Fails with `Conflict` if another identity
    /// already uses the email, `NotFound` if the identity does not exist.
    async fn update_profile(&self, id: &str, full_name: String, email: String) -> Result<Identity>;

    /// Replace the stored credential hash.
    /// Fails with `NotFound` if the identity does not exist.
    async fn update_credential_hash(&self, id: &str, hash: String) -> Result<()>;
}

/// Shared reference to a credential store
pub type SharedCredentialStore = Arc<dyn CredentialStore>;
