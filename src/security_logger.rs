//! Security-focused logging module to track authentication events

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Types of security events to track. Never carries raw tokens or passwords.
#[derive(Debug, Clone)]
pub enum SecurityEvent {
    // Session events
    LoginSucceeded { identity_id: String },
    LoginFailed { identifier: String, reason: String },
    LoggedOut { identity_id: String },
    TokenRotated { identity_id: String },
    RefreshTokenReuse { identity_id: String },
    PasswordChanged { identity_id: String },
    AccountUpdated { identity_id: String },
    Registered { identity_id: String },

    // Token and gate events
    TokenValidationFailed { kind: String, reason: String },
    UnauthorizedAccess { reason: String },

    // System security
    ConfigurationError { component: String, error: String },
}

impl SecurityEvent {
    /// Event key for counters and alert thresholds
    pub fn key(&self) -> &'static str {
        match self {
            SecurityEvent::LoginSucceeded { .. } => "login_success",
            SecurityEvent::LoginFailed { .. } => "login_failed",
            SecurityEvent::LoggedOut { .. } => "logout",
            SecurityEvent::TokenRotated { .. } => "token_rotated",
            SecurityEvent::RefreshTokenReuse { .. } => "refresh_token_reuse",
            SecurityEvent::PasswordChanged { .. } => "password_changed",
            SecurityEvent::AccountUpdated { .. } => "account_updated",
            SecurityEvent::Registered { .. } => "registered",
            SecurityEvent::TokenValidationFailed { .. } => "token_validation_failed",
            SecurityEvent::UnauthorizedAccess { .. } => "unauthorized_access",
            SecurityEvent::ConfigurationError { .. } => "config_error",
        }
    }
}

/// Security event with timestamp
#[derive(Debug, Clone)]
struct TimestampedEvent {
    event: SecurityEvent,
    timestamp: Instant,
}

/// Security logger for tracking and alerting on security events
pub struct SecurityLogger {
    events: Arc<RwLock<Vec<TimestampedEvent>>>,
    event_counts: Arc<RwLock<HashMap<&'static str, usize>>>,
    max_events: usize,
    alert_thresholds: HashMap<&'static str, usize>,
}

impl SecurityLogger {
    /// Create a new security logger
    pub fn new() -> Self {
        let mut alert_thresholds = HashMap::new();
        alert_thresholds.insert("login_failed", 5);
        alert_thresholds.insert("token_validation_failed", 10);
        alert_thresholds.insert("unauthorized_access", 20);
        // A replayed refresh token is a theft indicator on its own
        alert_thresholds.insert("refresh_token_reuse", 1);
        alert_thresholds.insert("config_error", 1);

        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            event_counts: Arc::new(RwLock::new(HashMap::new())),
            max_events: 10000,
            alert_thresholds,
        }
    }

    /// Log a security event
    pub async fn log_event(&self, event: SecurityEvent) {
        let event_key = event.key();

        {
            let mut events = self.events.write().await;
            events.push(TimestampedEvent {
                event: event.clone(),
                timestamp: Instant::now(),
            });

            // Limit memory usage
            if events.len() > self.max_events {
                let events_to_remove = events.len() - self.max_events;
                events.drain(0..events_to_remove);
            }
        }

        {
            let mut counts = self.event_counts.write().await;
            let count = counts.entry(event_key).or_insert(0);
            *count += 1;

            if let Some(&threshold) = self.alert_thresholds.get(event_key) {
                if *count >= threshold {
                    self.trigger_alert(event_key, *count, &event);
                    *count = 0;
                }
            }
        }

        match event {
            SecurityEvent::LoginSucceeded { identity_id } => {
                log::info!("SECURITY: Login success - Identity: {}", identity_id);
            }
            SecurityEvent::LoginFailed { identifier, reason } => {
                log::warn!("SECURITY: Login failed - Identifier: {}, Reason: {}", identifier, reason);
            }
            SecurityEvent::LoggedOut { identity_id } => {
                log::info!("SECURITY: Logout - Identity: {}", identity_id);
            }
            SecurityEvent::TokenRotated { identity_id } => {
                log::debug!("SECURITY: Refresh token rotated - Identity: {}", identity_id);
            }
            SecurityEvent::RefreshTokenReuse { identity_id } => {
                log::error!("SECURITY: Superseded refresh token presented - Identity: {}", identity_id);
            }
            SecurityEvent::PasswordChanged { identity_id } => {
                log::info!("SECURITY: Password changed - Identity: {}", identity_id);
            }
            SecurityEvent::AccountUpdated { identity_id } => {
                log::info!("SECURITY: Account details changed - Identity: {}", identity_id);
            }
            SecurityEvent::Registered { identity_id } => {
                log::info!("SECURITY: Identity registered - Identity: {}", identity_id);
            }
            SecurityEvent::TokenValidationFailed { kind, reason } => {
                log::warn!("SECURITY: Token validation failed - Kind: {}, Reason: {}", kind, reason);
            }
            SecurityEvent::UnauthorizedAccess { reason } => {
                log::warn!("SECURITY: Unauthorized request - Reason: {}", reason);
            }
            SecurityEvent::ConfigurationError { component, error } => {
                log::error!("SECURITY: Configuration error - Component: {}, Error: {}", component, error);
            }
        }
    }

    fn trigger_alert(&self, event_type: &str, count: usize, sample_event: &SecurityEvent) {
        log::error!("SECURITY ALERT: {} events of type '{}' detected", count, event_type);
        log::error!("Sample event: {:?}", sample_event);
    }

    /// Get recent security events
    pub async fn get_recent_events(&self, duration: Duration) -> Vec<SecurityEvent> {
        let events = self.events.read().await;
        let now = Instant::now();

        events
            .iter()
            .filter(|event| now.duration_since(event.timestamp) <= duration)
            .map(|event| event.event.clone())
            .collect()
    }

    /// Get event counters (reset whenever an alert fires)
    pub async fn get_event_stats(&self) -> HashMap<&'static str, usize> {
        self.event_counts.read().await.clone()
    }

    /// Clean up old events
    pub async fn cleanup_old_events(&self, max_age: Duration) {
        let mut events = self.events.write().await;
        let now = Instant::now();
        events.retain(|event| now.duration_since(event.timestamp) <= max_age);
    }

    /// Start periodic cleanup task
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                self.cleanup_old_events(Duration::from_secs(3600 * 24)).await;
            }
        });
    }
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Global security logger instance - thread-safe singleton
static SECURITY_LOGGER: OnceLock<Arc<SecurityLogger>> = OnceLock::new();

/// Initialize the global security logger. Must run inside a tokio runtime.
pub fn init_security_logger() {
    SECURITY_LOGGER.get_or_init(|| {
        let logger = Arc::new(SecurityLogger::new());
        logger.clone().start_cleanup_task();
        logger
    });
}

/// Get the global security logger
pub fn get_security_logger() -> Option<Arc<SecurityLogger>> {
    SECURITY_LOGGER.get().cloned()
}

/// Log a security event using the global logger
pub async fn log_security_event(event: SecurityEvent) {
    if let Some(logger) = get_security_logger() {
        logger.log_event(event).await;
    }
}
