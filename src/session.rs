use std::time::{Duration, Instant};

use crate::auth::AuthUser;

/// Idle timeout enforced on the client session, independent of token expiry.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Recommended polling cadence for [`IdleSession::check`]. Polling more or
/// less often only changes how quickly an expiry is noticed, never whether it
/// happens.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    SignedOut,
    Active,
    /// The idle threshold was crossed; the identity has been cleared and the
    /// caller must redirect to the login entry point and notify the user.
    Expired,
}

/// Tracks a single current identity plus its last-activity instant. Time is
/// always passed in so callers (and tests) own the clock.
pub struct IdleSession {
    timeout: Duration,
    user: Option<AuthUser>,
    last_activity: Instant,
}

impl IdleSession {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        IdleSession {
            timeout,
            user: None,
            last_activity: now,
        }
    }

    pub fn with_default_timeout(now: Instant) -> Self {
        Self::new(IDLE_TIMEOUT, now)
    }

    pub fn sign_in(&mut self, user: AuthUser, now: Instant) {
        self.user = Some(user);
        self.last_activity = now;
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    pub fn current(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Called on any observed user interaction (pointer, keyboard, scroll,
    /// touch). Resets the idle clock.
    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn check(&mut self, now: Instant) -> SessionCheck {
        if self.user.is_none() {
            return SessionCheck::SignedOut;
        }
        if now.duration_since(self.last_activity) > self.timeout {
            self.user = None;
            return SessionCheck::Expired;
        }
        SessionCheck::Active
    }
}
