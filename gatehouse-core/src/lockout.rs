//! Login attempt limiting
//!
//! Tracks consecutive failed sign-ins per account and locks the account for a
//! fixed window once the limit is hit. The limiter is pure over
//! [`LoginState`]; persisting the updated state is the caller's job.

use chrono::{DateTime, Duration, Utc};

use crate::account::LoginState;

#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failed attempts allowed before the account locks.
    pub max_attempts: u32,
    /// How long a locked account stays locked.
    pub lockout_window: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_window: Duration::minutes(15),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginLimiter {
    config: LockoutConfig,
}

impl LoginLimiter {
    pub fn new(config: LockoutConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Whether sign-in must be refused at `now`.
    ///
    /// An account whose `locked_until` equals `now` exactly is still locked;
    /// the first permitted attempt is strictly after the window ends.
    pub fn is_locked(&self, login: &LoginState, now: DateTime<Utc>) -> bool {
        login.locked_until.is_some_and(|until| now <= until)
    }

    /// Record a failed sign-in.
    ///
    /// Returns `true` if this failure locked the account (or it was already
    /// at the limit), in which case `locked_until` has been extended to a
    /// full window from `now`.
    pub fn record_failure(&self, login: &mut LoginState, now: DateTime<Utc>) -> bool {
        login.failed_attempts += 1;

        if login.failed_attempts >= self.config.max_attempts {
            login.locked_until = Some(now + self.config.lockout_window);
            true
        } else {
            false
        }
    }

    /// Record a successful sign-in, clearing the counter and any lock.
    pub fn record_success(&self, login: &mut LoginState) {
        login.failed_attempts = 0;
        login.locked_until = None;
    }
}
