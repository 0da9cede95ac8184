//! Account lifecycle facade
//!
//! [`Auth`] ties the pieces together: validation, hashing, the attempt
//! limiter, token issuing and the mailer. The HTTP layer calls into this type
//! only; nothing above it touches the store directly.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    Error,
    account::{Account, AccountKind, AccountStore, Email},
    error::AuthError,
    id::rotate_secret,
    lockout::LoginLimiter,
    mailer::{EmailFactory, Mailer},
    password::PasswordEngine,
    session::{Session, SessionIssuer},
    store::KvStore,
    token::{TokenPurpose, TokenService},
};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of email confirmation tokens.
    pub confirmation_ttl: Duration,
    /// Lifetime of password reset tokens.
    pub reset_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            confirmation_ttl: Duration::hours(24),
            reset_ttl: Duration::minutes(15),
        }
    }
}

pub struct Auth<S: KvStore> {
    accounts: AccountStore<S>,
    tokens: TokenService<S>,
    passwords: PasswordEngine,
    limiter: LoginLimiter,
    sessions: SessionIssuer,
    mailer: Arc<dyn Mailer>,
    factory: EmailFactory,
    config: AuthConfig,
}

impl<S: KvStore> Auth<S> {
    pub fn new(
        store: Arc<S>,
        sessions: SessionIssuer,
        mailer: Arc<dyn Mailer>,
        factory: EmailFactory,
    ) -> Self {
        Self {
            accounts: AccountStore::new(store.clone()),
            tokens: TokenService::new(store),
            passwords: PasswordEngine::default(),
            limiter: LoginLimiter::default(),
            sessions,
            mailer,
            factory,
            config: AuthConfig::default(),
        }
    }

    pub fn with_password_engine(mut self, passwords: PasswordEngine) -> Self {
        self.passwords = passwords;
        self
    }

    pub fn with_limiter(mut self, limiter: LoginLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a new account and send the confirmation email.
    ///
    /// Validation runs before anything is persisted; a request failing the
    /// email or password policy never reaches the store. Creation is atomic,
    /// so a concurrent duplicate registration loses with `UserAlreadyExists`.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Account, Error> {
        let email = Email::parse(email)?;
        self.passwords.validate(password)?;

        let hash = self.passwords.hash(password)?;
        let account = Account::new(email.clone(), hash);
        self.accounts.create(&account).await?;

        tracing::info!(email = %email, "new account registered");

        let token = self
            .tokens
            .issue(
                TokenPurpose::EmailConfirmation,
                &email,
                self.config.confirmation_ttl,
            )
            .await?;
        self.mailer
            .send(self.factory.confirmation(&email, &token))
            .await?;

        Ok(account)
    }

    /// Authenticate with email and password, issuing a session on success.
    ///
    /// Wrong password and unknown account both report `InvalidCredentials`.
    /// Once the attempt limit is hit the account locks for a window, during
    /// which even the correct password is refused.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        stay_signed_in: bool,
    ) -> Result<(Account, Session, String), Error> {
        let email = Email::parse(email)?;
        self.passwords.validate(password)?;

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            tracing::debug!(email = %email, "sign-in for unknown account");
            return Err(AuthError::InvalidCredentials.into());
        };

        if account.banned {
            tracing::debug!(email = %email, "sign-in for banned account");
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = Utc::now();
        if self.limiter.is_locked(&account.login, now) {
            tracing::debug!(email = %email, "sign-in while locked out");
            return Err(AuthError::NoMoreLoginAttempts {
                attempts: account.login.failed_attempts,
                max_attempts: self.limiter.max_attempts(),
            }
            .into());
        }

        if !self.passwords.verify(password, &account.password)? {
            let locked = self.limiter.record_failure(&mut account.login, now);
            self.accounts.save(&account).await?;

            if locked {
                tracing::warn!(email = %email, "account locked after repeated failures");
                return Err(AuthError::NoMoreLoginAttempts {
                    attempts: account.login.failed_attempts,
                    max_attempts: self.limiter.max_attempts(),
                }
                .into());
            }
            return Err(AuthError::InvalidCredentials.into());
        }

        self.limiter.record_success(&mut account.login);
        self.accounts.save(&account).await?;

        let (session, token) = self.sessions.issue(&email, stay_signed_in)?;
        tracing::info!(email = %email, stay_signed_in, "signed in");
        Ok((account, session, token))
    }

    /// Resolve a session token to its live account.
    ///
    /// The account record is re-read on every call, so a banned or deleted
    /// account loses access immediately even while its token is unexpired.
    pub async fn authenticate(&self, session_token: Option<&str>) -> Result<Account, Error> {
        let token = session_token.ok_or(AuthError::InvalidCredentials)?;
        let session = self.sessions.verify(token)?;

        let Some(account) = self.accounts.find_by_email(&session.email).await? else {
            tracing::debug!(email = %session.email, "session for deleted account");
            return Err(AuthError::InvalidCredentials.into());
        };

        if account.banned {
            tracing::debug!(email = %session.email, "session for banned account");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(account)
    }

    /// Redeem an email confirmation token and mark the account confirmed.
    pub async fn confirm_email(&self, token: Option<&str>) -> Result<Account, Error> {
        let email = self
            .tokens
            .redeem(token, TokenPurpose::EmailConfirmation)
            .await?;

        let mut account = self.accounts.get(&email).await?;
        account.confirmed = true;
        self.accounts.save(&account).await?;

        tracing::info!(email = %email, "email confirmed");
        Ok(account)
    }

    /// Issue a password reset token and email it to the account.
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        let email = Email::parse(email)?;
        let account = self.accounts.get(&email).await?;

        let token = self
            .tokens
            .issue(TokenPurpose::PasswordReset, &account.email, self.config.reset_ttl)
            .await?;
        self.mailer
            .send(self.factory.password_reset(&account.email, &token))
            .await?;

        tracing::info!(email = %email, "password reset requested");
        Ok(())
    }

    /// Check a reset token without consuming it, so the client can vet the
    /// link before asking for a new password.
    pub async fn check_reset_token(&self, token: Option<&str>) -> Result<(), Error> {
        self.tokens.check(token, TokenPurpose::PasswordReset).await
    }

    /// Set a new password, either via a reset token or for an already
    /// authenticated account.
    ///
    /// The token is consumed on success; an active lockout window is left in
    /// place and expires on its own.
    pub async fn reset_password(
        &self,
        token: Option<&str>,
        authenticated: Option<&Email>,
        new_password: &str,
    ) -> Result<Account, Error> {
        self.passwords.validate(new_password)?;

        let email = match authenticated {
            Some(email) => email.clone(),
            None => self.tokens.redeem(token, TokenPurpose::PasswordReset).await?,
        };

        let mut account = self.accounts.get(&email).await?;
        account.password = self.passwords.hash(new_password)?;
        self.accounts.save(&account).await?;

        tracing::info!(email = %email, "password reset");
        Ok(account)
    }

    /// Rotate the account's admin secret, returning the new value.
    pub async fn renew_secret(&self, email: &Email) -> Result<String, Error> {
        let mut account = self.accounts.get(email).await?;
        account.secret = rotate_secret(&account.secret);
        self.accounts.save(&account).await?;

        tracing::info!(email = %email, "secret renewed");
        Ok(account.secret)
    }

    pub async fn set_banned(&self, email: &Email, banned: bool) -> Result<Account, Error> {
        self.edit(email, |account| account.banned = banned).await
    }

    pub async fn set_confirmed(&self, email: &Email, confirmed: bool) -> Result<Account, Error> {
        self.edit(email, |account| account.confirmed = confirmed).await
    }

    pub async fn set_favorited(&self, email: &Email, favorited: bool) -> Result<Account, Error> {
        self.edit(email, |account| account.favorited = favorited).await
    }

    pub async fn set_kind(&self, email: &Email, kind: AccountKind) -> Result<Account, Error> {
        self.edit(email, |account| account.kind = kind).await
    }

    async fn edit<F>(&self, email: &Email, apply: F) -> Result<Account, Error>
    where
        F: FnOnce(&mut Account),
    {
        let mut account = self.accounts.get(email).await?;
        apply(&mut account);
        self.accounts.save(&account).await?;

        tracing::info!(email = %email, "account updated");
        Ok(account)
    }

    /// Delete an account. Live sessions for it stop resolving immediately.
    pub async fn delete_account(&self, email: &Email) -> Result<(), Error> {
        // Fetching first maps unknown emails to MissingAccount
        let account = self.accounts.get(email).await?;
        self.accounts.delete(&account.email).await?;

        tracing::info!(email = %email, "account deleted");
        Ok(())
    }

    /// Delete expired and consumed token records, returning the count.
    ///
    /// Meant to run periodically on stores without native TTL support.
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, Error> {
        self.tokens.cleanup_expired().await
    }
}
