//! Time-bound single-use tokens
//!
//! Tokens back the email confirmation and password reset flows. Each token is
//! an opaque nonce keyed as `token:<nonce>` and bound to one account and one
//! purpose. Redemption is at-most-once: the consumed marker is written with a
//! compare-and-swap, so two requests racing on the same token see exactly one
//! success.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::Email,
    error::{StorageError, TokenError},
    id::generate_nonce,
    store::KvStore,
};

/// What a token is allowed to authorize. A token issued for one purpose is
/// invalid for any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    EmailConfirmation,
    PasswordReset,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPurpose::EmailConfirmation => write!(f, "email_confirmation"),
            TokenPurpose::PasswordReset => write!(f, "password_reset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub nonce: String,
    pub purpose: TokenPurpose,
    pub email: Email,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set once the token has been redeemed.
    pub used_at: Option<DateTime<Utc>>,
}

impl Token {
    /// A token is live strictly before its expiry instant; at `expires_at`
    /// it is already expired, so a zero lifetime never yields a usable token.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}

/// Issues, checks and redeems tokens on top of a [`KvStore`].
pub struct TokenService<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> TokenService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn key(nonce: &str) -> String {
        format!("token:{nonce}")
    }

    fn serialize(token: &Token) -> Result<String, Error> {
        serde_json::to_string(token)
            .map_err(|e| Error::Storage(StorageError::Serialization(e.to_string())))
    }

    /// Issue a fresh token for `email` with the given purpose and lifetime.
    pub async fn issue(
        &self,
        purpose: TokenPurpose,
        email: &Email,
        ttl: Duration,
    ) -> Result<Token, Error> {
        let now = Utc::now();
        let token = Token {
            nonce: generate_nonce(),
            purpose,
            email: email.clone(),
            issued_at: now,
            expires_at: now + ttl,
            used_at: None,
        };

        self.store
            .set(&Self::key(&token.nonce), &Self::serialize(&token)?)
            .await?;

        tracing::debug!(purpose = %purpose, email = %email, "issued token");
        Ok(token)
    }

    async fn load(&self, nonce: &str, purpose: TokenPurpose) -> Result<(Token, String), Error> {
        let Some(raw) = self.store.get(&Self::key(nonce)).await? else {
            return Err(TokenError::Invalid.into());
        };

        let token: Token = serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(StorageError::Serialization(e.to_string())))?;

        if token.purpose != purpose {
            return Err(TokenError::Invalid.into());
        }

        Ok((token, raw))
    }

    /// Redeem a token, consuming it.
    ///
    /// Exactly one redemption can succeed per token; a second redemption, a
    /// purpose mismatch or an unknown nonce all fail with `InvalidToken`,
    /// while an unused-but-stale token fails with `ExpiredToken`. A missing
    /// token (the client sent none) is its own error.
    pub async fn redeem(
        &self,
        supplied: Option<&str>,
        purpose: TokenPurpose,
    ) -> Result<Email, Error> {
        let nonce = supplied.ok_or(TokenError::Missing)?;
        let (token, raw) = self.load(nonce, purpose).await?;

        if token.is_used() {
            return Err(TokenError::Invalid.into());
        }

        let now = Utc::now();
        if token.is_expired(now) {
            return Err(TokenError::Expired.into());
        }

        let consumed = Token {
            used_at: Some(now),
            ..token.clone()
        };
        let swapped = self
            .store
            .compare_and_swap(&Self::key(nonce), &raw, &Self::serialize(&consumed)?)
            .await?;

        // Lost the race against a concurrent redemption
        if !swapped {
            return Err(TokenError::Invalid.into());
        }

        // The swap claimed the token; the record itself is no longer needed.
        self.store.delete(&Self::key(nonce)).await?;

        tracing::debug!(purpose = %purpose, email = %token.email, "redeemed token");
        Ok(token.email)
    }

    /// Check a token without consuming it.
    ///
    /// Used to vet a reset link before the user has typed a new password.
    pub async fn check(&self, supplied: Option<&str>, purpose: TokenPurpose) -> Result<(), Error> {
        let nonce = supplied.ok_or(TokenError::Missing)?;
        let (token, _) = self.load(nonce, purpose).await?;

        if token.is_used() {
            return Err(TokenError::Invalid.into());
        }

        if token.is_expired(Utc::now()) {
            return Err(TokenError::Expired.into());
        }

        Ok(())
    }

    /// Delete expired and consumed token records.
    ///
    /// Expiry is enforced logically at redemption; this sweep keeps the
    /// token keyspace bounded on stores without native TTL support. Returns
    /// the number of records removed.
    pub async fn cleanup_expired(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let mut removed = 0;

        for (key, raw) in self.store.scan_prefix("token:").await? {
            let Ok(token) = serde_json::from_str::<Token>(&raw) else {
                continue;
            };
            if token.is_used() || token.is_expired(now) {
                self.store.delete(&key).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "swept stale tokens");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> TokenService<MemoryStore> {
        TokenService::new(Arc::new(MemoryStore::new()))
    }

    fn email() -> Email {
        Email::parse("alice@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_issue_and_redeem() {
        let service = service();
        let token = service
            .issue(TokenPurpose::EmailConfirmation, &email(), Duration::hours(24))
            .await
            .unwrap();

        let redeemed = service
            .redeem(Some(&token.nonce), TokenPurpose::EmailConfirmation)
            .await
            .unwrap();
        assert_eq!(redeemed, email());
    }

    #[tokio::test]
    async fn test_redeem_is_single_use() {
        let service = service();
        let token = service
            .issue(TokenPurpose::PasswordReset, &email(), Duration::minutes(15))
            .await
            .unwrap();

        service
            .redeem(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await
            .unwrap();

        let second = service
            .redeem(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await;
        assert!(matches!(second, Err(Error::Token(TokenError::Invalid))));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let service = service();
        let result = service.redeem(None, TokenPurpose::PasswordReset).await;
        assert!(matches!(result, Err(Error::Token(TokenError::Missing))));
    }

    #[tokio::test]
    async fn test_unknown_nonce_is_invalid() {
        let service = service();
        let result = service
            .redeem(Some("no-such-nonce"), TokenPurpose::PasswordReset)
            .await;
        assert!(matches!(result, Err(Error::Token(TokenError::Invalid))));
    }

    #[tokio::test]
    async fn test_purpose_mismatch_is_invalid() {
        let service = service();
        let token = service
            .issue(TokenPurpose::EmailConfirmation, &email(), Duration::hours(24))
            .await
            .unwrap();

        let result = service
            .redeem(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await;
        assert!(matches!(result, Err(Error::Token(TokenError::Invalid))));

        // Still redeemable for the right purpose
        service
            .redeem(Some(&token.nonce), TokenPurpose::EmailConfirmation)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_zero_ttl_token_is_dead_on_arrival() {
        let service = service();
        let token = service
            .issue(TokenPurpose::PasswordReset, &email(), Duration::zero())
            .await
            .unwrap();

        let result = service
            .redeem(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await;
        assert!(matches!(result, Err(Error::Token(TokenError::Expired))));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let token = Token {
            nonce: "nonce".to_string(),
            purpose: TokenPurpose::PasswordReset,
            email: email(),
            issued_at: now - Duration::minutes(15),
            expires_at: now,
            used_at: None,
        };

        // Expired exactly at its expiry instant, live one tick before.
        assert!(token.is_expired(now));
        assert!(!token.is_expired(now - Duration::milliseconds(1)));
        assert!(token.is_expired(now + Duration::milliseconds(1)));
    }

    #[tokio::test]
    async fn test_check_does_not_consume() {
        let service = service();
        let token = service
            .issue(TokenPurpose::PasswordReset, &email(), Duration::minutes(15))
            .await
            .unwrap();

        service
            .check(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await
            .unwrap();
        service
            .check(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await
            .unwrap();

        // The token is still redeemable exactly once
        service
            .redeem(Some(&token.nonce), TokenPurpose::PasswordReset)
            .await
            .unwrap();
        assert!(
            service
                .check(Some(&token.nonce), TokenPurpose::PasswordReset)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_redeem_deletes_the_record() {
        let store = Arc::new(MemoryStore::new());
        let service = TokenService::new(store.clone());
        let token = service
            .issue(TokenPurpose::EmailConfirmation, &email(), Duration::hours(24))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        service
            .redeem(Some(&token.nonce), TokenPurpose::EmailConfirmation)
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_tokens_and_keeps_live_ones() {
        let store = Arc::new(MemoryStore::new());
        let service = TokenService::new(store.clone());

        let live = service
            .issue(TokenPurpose::PasswordReset, &email(), Duration::minutes(15))
            .await
            .unwrap();
        service
            .issue(TokenPurpose::PasswordReset, &email(), Duration::zero())
            .await
            .unwrap();
        service
            .issue(TokenPurpose::EmailConfirmation, &email(), Duration::seconds(-30))
            .await
            .unwrap();

        let removed = service.cleanup_expired().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);

        // The live token survives the sweep and stays redeemable
        service
            .redeem(Some(&live.nonce), TokenPurpose::PasswordReset)
            .await
            .unwrap();

        // Nothing left, the sweep is a no-op
        assert_eq!(service.cleanup_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_redeem_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(TokenService::new(store));
        let token = service
            .issue(TokenPurpose::PasswordReset, &email(), Duration::minutes(15))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let nonce = token.nonce.clone();
            handles.push(tokio::spawn(async move {
                service
                    .redeem(Some(&nonce), TokenPurpose::PasswordReset)
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
