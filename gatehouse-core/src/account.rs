//! Account model and persistence
//!
//! Accounts are keyed by normalized email address (`user:<email>`) and stored
//! as a single JSON record containing the credential hash, the login-attempt
//! state, the per-account admin secret and the administrative flags.

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::{AuthError, StorageError, ValidationError},
    id::generate_secret,
    store::KvStore,
    validation::validate_email,
};

/// A validated, normalized email address.
///
/// Construction via [`Email::parse`] trims surrounding whitespace, lowercases
/// the address and validates the format, so two spellings of the same mailbox
/// always map to the same account key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_lowercase();
        validate_email(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An encoded password hash.
///
/// Holds the full PHC string (algorithm, parameters, salt, digest). Debug
/// output is redacted so hashes never end up in logs by accident, and there
/// is deliberately no equality: passwords compare only through the engine's
/// verify operation.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(****)")
    }
}

/// Failed sign-in tracking, embedded in the account record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginState {
    /// Consecutive failed attempts since the last successful sign-in.
    pub failed_attempts: u32,
    /// When set, sign-in is refused up to and including this instant.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Privilege level of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Regular,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub email: Email,
    pub password: PasswordHash,
    pub kind: AccountKind,
    /// Human-readable per-account secret, rotated on demand.
    pub secret: String,
    /// Whether the email address has been confirmed.
    pub confirmed: bool,
    pub banned: bool,
    pub favorited: bool,
    pub login: LoginState,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh, unconfirmed regular account with a generated secret.
    pub fn new(email: Email, password: PasswordHash) -> Self {
        Self {
            email,
            password,
            kind: AccountKind::default(),
            secret: generate_secret(),
            confirmed: false,
            banned: false,
            favorited: false,
            login: LoginState::default(),
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == AccountKind::Admin
    }
}

/// Account persistence on top of a [`KvStore`].
pub struct AccountStore<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> AccountStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn key(email: &Email) -> String {
        format!("user:{email}")
    }

    fn serialize(account: &Account) -> Result<String, Error> {
        serde_json::to_string(account)
            .map_err(|e| Error::Storage(StorageError::Serialization(e.to_string())))
    }

    /// Create a new account record.
    ///
    /// Creation is conditional on the key being absent, so concurrent
    /// registrations for the same email produce exactly one account and the
    /// losers observe `UserAlreadyExists`.
    pub async fn create(&self, account: &Account) -> Result<(), Error> {
        let value = Self::serialize(account)?;
        let created = self
            .store
            .set_if_absent(&Self::key(&account.email), &value)
            .await?;

        if created {
            Ok(())
        } else {
            Err(AuthError::UserAlreadyExists.into())
        }
    }

    pub async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, Error> {
        let Some(value) = self.store.get(&Self::key(email)).await? else {
            return Ok(None);
        };

        let account = serde_json::from_str(&value)
            .map_err(|e| Error::Storage(StorageError::Serialization(e.to_string())))?;
        Ok(Some(account))
    }

    /// Fetch an account, mapping absence to `MissingAccount`.
    pub async fn get(&self, email: &Email) -> Result<Account, Error> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::MissingAccount.into())
    }

    pub async fn save(&self, account: &Account) -> Result<(), Error> {
        let value = Self::serialize(account)?;
        self.store.set(&Self::key(&account.email), &value).await?;
        Ok(())
    }

    pub async fn delete(&self, email: &Email) -> Result<(), Error> {
        self.store.delete(&Self::key(email)).await?;
        Ok(())
    }
}
