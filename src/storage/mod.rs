//! Credential persistence

pub mod memory;
pub mod traits;

pub use memory::{create_memory_credential_store, MemoryCredentialStore};
pub use traits::{CredentialStore, SharedCredentialStore};
