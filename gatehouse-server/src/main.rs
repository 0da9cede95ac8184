mod config;
mod lifecycle;
mod mailer;

use std::sync::Arc;

use gatehouse_axum::{CookieConfig, create_router};
use gatehouse_core::{
    Auth, AuthConfig, EmailFactory, LogMailer, LoginLimiter, Mailer, MemoryStore, SessionIssuer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::lifecycle::{AppServer, Shutdown};
use crate::mailer::SmtpMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            tracing::warn!("SMTP not configured, outbound email goes to the log");
            Arc::new(LogMailer)
        }
    };

    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(
        Auth::new(
            store,
            SessionIssuer::new(config.session.clone()),
            mailer,
            EmailFactory::new(&config.client_url),
        )
        .with_limiter(LoginLimiter::new(config.lockout.clone()))
        .with_config(AuthConfig {
            confirmation_ttl: config.confirmation_ttl,
            reset_ttl: config.reset_ttl,
        }),
    );

    spawn_token_sweep(auth.clone(), config.token_sweep_interval);

    let cookie_config = if config.is_production {
        CookieConfig::default()
    } else {
        CookieConfig::development()
    };
    let app = create_router(auth, cookie_config);

    let mut server = AppServer::new();
    let addr = server
        .bind(&format!("{}:{}", config.host, config.port))
        .await?;
    server.start(app)?;
    info!(%addr, "gatehouse listening");

    let signal = shutdown_signal().await;
    match server.stop(signal, config.shutdown_timeout).await {
        Shutdown::Graceful => Ok(()),
        Shutdown::Forced => std::process::exit(1),
    }
}

/// Periodically delete expired and consumed tokens, since the in-memory
/// store has no native TTL.
fn spawn_token_sweep(auth: Arc<Auth<MemoryStore>>, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match auth.cleanup_expired_tokens().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "swept stale tokens");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("token sweep failed: {e}"),
            }
        }
    });
}

/// Wait for SIGINT or SIGTERM, returning which one fired.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
