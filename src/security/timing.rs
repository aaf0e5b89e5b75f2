//! Timing side-channel guards for credential and refresh-token checks

use std::time::{Duration, Instant};

/// Compare a presented secret against the stored one without an early exit
/// on the first differing byte. Length mismatch still returns immediately;
/// token length is not secret.
pub fn constant_time_eq(stored: &str, presented: &str) -> bool {
    if stored.len() != presented.len() {
        return false;
    }

    stored
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (s, p)| acc | (s ^ p))
        == 0
}

/// Sleep for whatever remains of `floor` since `started`
pub async fn add_auth_delay(started: Instant, floor: Duration) {
    if let Some(remaining) = floor.checked_sub(started.elapsed()) {
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// Started at the top of a login attempt; failure paths wait on it so an
/// unknown identity and a wrong password take the same wall-clock time.
pub struct AuthTimer {
    started: Instant,
    floor: Duration,
}

impl AuthTimer {
    pub fn new(floor: Duration) -> Self {
        Self {
            started: Instant::now(),
            floor,
        }
    }

    pub async fn wait(self) {
        add_auth_delay(self.started, self.floor).await;
    }
}
