use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use vidtube::auth::{
    AuthGate, Claims, CredentialHasher, Identity, NewIdentity, SessionManager, TokenKind, TokenService,
};
use vidtube::storage::{CredentialStore, MemoryCredentialStore, SharedCredentialStore};
use vidtube::{Result, VidTubeError};

const ACCESS_KEY: &str = "k9Qv2_Lm8Zx4-Rt7Wb1Yp6Hs3Nd0Fj5Gc";
const REFRESH_KEY: &str = "Zp4_Tn7Wq1-Bx8Kd3Rm6Yv0Hc5Js2Lf9G";

struct Fixture {
    sessions: SessionManager,
    gate: AuthGate,
    tokens: Arc<TokenService>,
}

fn fixture() -> Fixture {
    let store: SharedCredentialStore = Arc::new(MemoryCredentialStore::new());
    let tokens = Arc::new(TokenService::new(
        ACCESS_KEY,
        REFRESH_KEY,
        Duration::from_secs(900),
        Duration::from_secs(86_400),
    ));
    let hasher = CredentialHasher::with_cost(1024, 1).unwrap();
    Fixture {
        sessions: SessionManager::new(store.clone(), tokens.clone(), hasher),
        gate: AuthGate::new(tokens.clone(), store),
        tokens,
    }
}

async fn logged_in(fixture: &Fixture) -> (String, String) {
    let view = fixture
        .sessions
        .register(NewIdentity {
            full_name: Some("Gate User".to_string()),
            email: Some("gate@example.com".to_string()),
            username: Some("gate".to_string()),
            password: Some("correctpw".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let outcome = fixture.sessions.login("gate", "correctpw").await.unwrap();
    (view.id, outcome.tokens.access_token)
}

#[tokio::test]
async fn test_valid_token_from_header_or_cookie() {
    let fixture = fixture();
    let (id, access) = logged_in(&fixture).await;

    let header = format!("Bearer {}", access);
    let via_header = fixture.gate.authenticate(None, Some(&header)).await.unwrap();
    assert_eq!(via_header.id, id);
    assert_eq!(via_header.username, "gate");

    let via_cookie = fixture.gate.authenticate(Some(&access), None).await.unwrap();
    assert_eq!(via_cookie.id, id);
}

#[tokio::test]
async fn test_cookie_wins_over_header() {
    let fixture = fixture();
    let (id, access) = logged_in(&fixture).await;

    // A bad header is ignored when the cookie carries a good token
    let resolved = fixture
        .gate
        .authenticate(Some(&access), Some("Bearer garbage"))
        .await
        .unwrap();
    assert_eq!(resolved.id, id);

    // A bad cookie is not rescued by a good header
    let header = format!("Bearer {}", access);
    assert!(matches!(
        fixture.gate.authenticate(Some("garbage"), Some(&header)).await,
        Err(VidTubeError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_missing_and_malformed_tokens() {
    let fixture = fixture();

    assert!(matches!(
        fixture.gate.authenticate(None, None).await,
        Err(VidTubeError::Unauthorized(_))
    ));
    assert!(matches!(
        fixture.gate.authenticate(None, Some("Token abc")).await,
        Err(VidTubeError::Unauthorized(_))
    ));

    let oversized = "a".repeat(5000);
    assert!(matches!(
        fixture.gate.authenticate(Some(&oversized), None).await,
        Err(VidTubeError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_expired_access_token_rejected() {
    let fixture = fixture();
    let (id, _) = logged_in(&fixture).await;

    let mut claims = Claims::new(&id, TokenKind::Access, Duration::from_secs(60)).unwrap();
    claims.iat -= 600;
    claims.exp = claims.iat + 60;
    let expired = fixture.tokens.sign(&claims).unwrap();

    assert!(matches!(
        fixture.gate.authenticate(Some(&expired), None).await,
        Err(VidTubeError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_refresh_token_cannot_pass_gate() {
    let fixture = fixture();
    let (id, _) = logged_in(&fixture).await;

    let refresh = fixture.tokens.issue_refresh_token(&id).unwrap();
    assert!(matches!(
        fixture.gate.authenticate(Some(&refresh), None).await,
        Err(VidTubeError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_wrongly_signed_token_rejected() {
    let fixture = fixture();
    let (id, _) = logged_in(&fixture).await;

    let foreign = TokenService::new(
        "Qm3_Xr8Vb2-Lt6Np1Wk9Zs4Hd7Gc0Jf5Y",
        "Wd5_Pk1Zs8-Nm4Gt7Bv2Xc9Lh6Rq3Jy0F",
        Duration::from_secs(900),
        Duration::from_secs(86_400),
    );
    let forged = foreign.issue_access_token(&id).unwrap();

    assert!(matches!(
        fixture.gate.authenticate(Some(&forged), None).await,
        Err(VidTubeError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_token_for_unknown_identity_rejected() {
    let fixture = fixture();
    let orphan = fixture.tokens.issue_access_token("no-such-identity").unwrap();

    assert!(matches!(
        fixture.gate.authenticate(Some(&orphan), None).await,
        Err(VidTubeError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_logout_leaves_access_token_valid_until_expiry() {
    let fixture = fixture();
    let (id, access) = logged_in(&fixture).await;

    fixture.sessions.logout(&id).await.unwrap();
    assert!(fixture.gate.authenticate(Some(&access), None).await.is_ok());
}

/// Backend that fails every call
struct UnavailableStore;

fn backend_down() -> VidTubeError {
    VidTubeError::SystemError("connection refused".to_string())
}

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn insert(&self, _identity: Identity) -> Result<()> {
        Err(backend_down())
    }

    async fn find_by_username_or_email(&self, _identifier: &str) -> Result<Option<Identity>> {
        Err(backend_down())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<Identity>> {
        Err(backend_down())
    }

    async fn update_refresh_token(&self, _id: &str, _token: Option<String>) -> Result<()> {
        Err(backend_down())
    }

    async fn swap_refresh_token(&self, _id: &str, _expected: &str, _replacement: String) -> Result<bool> {
        Err(backend_down())
    }

    async fn update_profile(&self, _id: &str, _full_name: String, _email: String) -> Result<Identity> {
        Err(backend_down())
    }

    async fn update_credential_hash(&self, _id: &str, _hash: String) -> Result<()> {
        Err(backend_down())
    }
}

#[tokio::test]
async fn test_backend_failure_is_unauthorized_at_gate_and_invalid_on_refresh() {
    let store: SharedCredentialStore = Arc::new(UnavailableStore);
    let tokens = Arc::new(TokenService::new(
        ACCESS_KEY,
        REFRESH_KEY,
        Duration::from_secs(900),
        Duration::from_secs(86_400),
    ));
    let gate = AuthGate::new(tokens.clone(), store.clone());
    let sessions = SessionManager::new(
        store,
        tokens.clone(),
        CredentialHasher::with_cost(1024, 1).unwrap(),
    );

    let access = tokens.issue_access_token("u1").unwrap();
    assert!(matches!(
        gate.authenticate(Some(&access), None).await,
        Err(VidTubeError::Unauthorized(_))
    ));

    let refresh = tokens.issue_refresh_token("u1").unwrap();
    assert!(matches!(
        sessions.refresh(&refresh).await,
        Err(VidTubeError::InvalidToken)
    ));
}
