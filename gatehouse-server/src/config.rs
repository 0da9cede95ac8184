//! Environment-driven configuration
//!
//! Every knob has a development default; production (`ENVIRONMENT=production`)
//! refuses to start with the default session secret and turns secure cookies
//! on. SMTP is optional: without `SMTP_RELAY` outbound mail goes to the log.

use std::str::FromStr;
use std::time::Duration as StdDuration;

use anyhow::{Context, bail};
use chrono::Duration;
use gatehouse_core::{LockoutConfig, SessionConfig};

const DEV_SESSION_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub relay: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the client application, used in email links.
    pub client_url: String,
    pub is_production: bool,
    pub session: SessionConfig,
    pub lockout: LockoutConfig,
    pub confirmation_ttl: Duration,
    pub reset_ttl: Duration,
    /// How long to wait for in-flight requests before forcing exit.
    pub shutdown_timeout: StdDuration,
    /// Interval of the stale-token sweep.
    pub token_sweep_interval: StdDuration,
    pub smtp: Option<SmtpConfig>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let is_production = env_or("ENVIRONMENT", "development") == "production";

        let secret = env_or("SESSION_SECRET", DEV_SESSION_SECRET);
        if secret == DEV_SESSION_SECRET {
            if is_production {
                bail!("SESSION_SECRET must be set in production");
            }
            tracing::warn!("SESSION_SECRET not set, using the development default");
        }

        let mut session = SessionConfig::new(secret.into_bytes());
        session.default_ttl = Duration::minutes(env_parse("SESSION_TTL_MINUTES", 60));
        session.extended_ttl = Duration::days(env_parse("SESSION_EXTENDED_TTL_DAYS", 30));

        let lockout = LockoutConfig {
            max_attempts: env_parse("MAX_LOGIN_ATTEMPTS", 5),
            lockout_window: Duration::minutes(env_parse("LOCKOUT_MINUTES", 15)),
        };

        let smtp = match std::env::var("SMTP_RELAY") {
            Ok(relay) => Some(SmtpConfig {
                relay,
                username: std::env::var("SMTP_USERNAME").context("SMTP_USERNAME is required")?,
                password: std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is required")?,
                from: std::env::var("SMTP_FROM").context("SMTP_FROM is required")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8000),
            client_url: env_or("CLIENT_URL", "http://localhost:5173"),
            is_production,
            session,
            lockout,
            confirmation_ttl: Duration::hours(env_parse("CONFIRMATION_TTL_HOURS", 24)),
            reset_ttl: Duration::minutes(env_parse("RESET_TTL_MINUTES", 15)),
            shutdown_timeout: StdDuration::from_secs(env_parse("SHUTDOWN_TIMEOUT_SECONDS", 2)),
            token_sweep_interval: StdDuration::from_secs(
                60 * env_parse("TOKEN_SWEEP_MINUTES", 60),
            ),
            smtp,
        })
    }
}
