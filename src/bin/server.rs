use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use vidtube::auth::{AuthGate, CredentialHasher, SessionManager, TokenService};
use vidtube::config::ServerConfig;
use vidtube::handlers::{routes, AppState};
use vidtube::security_logger::{init_security_logger, log_security_event, SecurityEvent};
use vidtube::storage::create_memory_credential_store;

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv_result {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    init_security_logger();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log_security_event(SecurityEvent::ConfigurationError {
                component: "server".to_string(),
                error: e.to_string(),
            })
            .await;
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, access_ttl={}s, refresh_ttl={}s",
        config.host,
        config.port,
        config.access_token_ttl.as_secs(),
        config.refresh_token_ttl.as_secs()
    );
    if !config.cookie_secure {
        warn!("Token cookies are not marked Secure; only use this behind local development");
    }

    let hasher = match CredentialHasher::with_cost(config.argon2_memory_kib, config.argon2_iterations) {
        Ok(hasher) => hasher,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let store = create_memory_credential_store();
    let tokens = Arc::new(TokenService::from_config(&config));
    let sessions = Arc::new(
        SessionManager::new(store.clone(), tokens.clone(), hasher)
            .with_min_failure_duration(config.auth_min_duration),
    );
    let gate = Arc::new(AuthGate::new(tokens, store));

    let state = AppState {
        sessions,
        gate,
        cookie_secure: config.cookie_secure,
    };
    let routes = routes(state);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    match (config.enable_tls, config.tls_cert_path, config.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            info!("Starting VidTube auth server on https://{}", addr);
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .run(addr)
                .await;
        }
        _ => {
            info!("Starting VidTube auth server on http://{}", addr);
            warp::serve(routes).run(addr).await;
        }
    }
}
