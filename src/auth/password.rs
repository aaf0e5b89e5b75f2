//! Password hashing and verification (Argon2id)

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::error::{Result, VidTubeError};

/// Salted Argon2id hasher. Verification reads cost parameters from the stored
/// hash, so changing the configured cost never locks out existing identities.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Creates a hasher with explicit memory (KiB) and iteration cost
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| VidTubeError::ConfigError(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| VidTubeError::SystemError(format!("Failed to encode salt: {}", e)))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| VidTubeError::SystemError(format!("Failed to hash password: {}", e)))
    }

    /// Verify a password against a stored hash. Malformed hashes verify false.
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::error!("Stored credential hash is unparsable: {}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Hash on the blocking pool
    pub async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| VidTubeError::SystemError(format!("Hashing task failed: {}", e)))?
    }

    /// Verify on the blocking pool
    pub async fn verify_blocking(&self, hash: String, password: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|e| VidTubeError::SystemError(format!("Verification task failed: {}", e)))
    }
}
