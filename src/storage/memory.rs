//! In-memory credential storage for development and testing
//!
//! All maps live behind a single lock so that each operation, including the
//! compare-and-swap used for refresh-token rotation, is atomic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{CredentialStore, SharedCredentialStore};
use crate::auth::identity::Identity;
use crate::error::{Result, VidTubeError};

#[derive(Default)]
struct Tables {
    identities: HashMap<String, Identity>,
    usernames: HashMap<String, String>, // username -> id
    emails: HashMap<String, String>,    // email -> id
}

/// In-memory credential storage
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.tables.read().await.identities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn not_found(id: &str) -> VidTubeError {
    log::debug!("Credential store has no identity {}", id);
    VidTubeError::NotFound("User".to_string())
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, identity: Identity) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.usernames.contains_key(&identity.username) {
            return Err(VidTubeError::Conflict("Username already exists".to_string()));
        }
        if tables.emails.contains_key(&identity.email) {
            return Err(VidTubeError::Conflict("Email already exists".to_string()));
        }

        tables.usernames.insert(identity.username.clone(), identity.id.clone());
        tables.emails.insert(identity.email.clone(), identity.id.clone());
        tables.identities.insert(identity.id.clone(), identity);
        Ok(())
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<Identity>> {
        let key = identifier.trim().to_lowercase();
        let tables = self.tables.read().await;

        let id = tables.usernames.get(&key).or_else(|| tables.emails.get(&key));
        Ok(id.and_then(|id| tables.identities.get(id)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>> {
        let tables = self.tables.read().await;
        Ok(tables.identities.get(id).cloned())
    }

    async fn update_refresh_token(&self, id: &str, token: Option<String>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let identity = tables.identities.get_mut(id).ok_or_else(|| not_found(id))?;
        identity.refresh_token = token;
        identity.touch();
        Ok(())
    }

    async fn swap_refresh_token(&self, id: &str, expected: &str, replacement: String) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let identity = match tables.identities.get_mut(id) {
            Some(identity) => identity,
            None => return Ok(false),
        };

        if identity.refresh_token.as_deref() != Some(expected) {
            return Ok(false);
        }

        identity.refresh_token = Some(replacement);
        identity.touch();
        Ok(true)
    }

    async fn update_profile(&self, id: &str, full_name: String, email: String) -> Result<Identity> {
        let email = email.trim().to_lowercase();
        let mut tables = self.tables.write().await;

        let previous_email = match tables.identities.get(id) {
            Some(identity) => identity.email.clone(),
            None => return Err(not_found(id)),
        };
        if tables.emails.get(&email).is_some_and(|owner| owner != id) {
            return Err(VidTubeError::Conflict("Email already exists".to_string()));
        }

        tables.emails.remove(&previous_email);
        tables.emails.insert(email.clone(), id.to_string());

        let identity = tables.identities.get_mut(id).ok_or_else(|| not_found(id))?;
        identity.full_name = full_name;
        identity.email = email;
        identity.touch();
        Ok(identity.clone())
    }

    async fn update_credential_hash(&self, id: &str, hash: String) -> Result<()> {
        let mut tables = self.tables.write().await;
        let identity = tables.identities.get_mut(id).ok_or_else(|| not_found(id))?;
        identity.credential_hash = hash;
        identity.touch();
        Ok(())
    }
}

/// Create a new memory-based credential store
pub fn create_memory_credential_store() -> SharedCredentialStore {
    Arc::new(MemoryCredentialStore::new())
}
