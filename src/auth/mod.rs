//! Authentication and session module

pub mod gate;
pub mod identity;
pub mod password;
pub mod session;
pub mod token;

// Re-export main components
pub use gate::{with_identity, AuthGate};
pub use identity::{Identity, IdentityView, NewIdentity};
pub use password::CredentialHasher;
pub use session::{LoginOutcome, SessionManager, TokenPair};
pub use token::{Claims, TokenKind, TokenService, VerifiedToken};
