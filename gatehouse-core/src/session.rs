//! Session issuing and verification
//!
//! Sessions are stateless HS256 JWTs carrying the account email and an
//! expiry. Two lifetimes exist: a short default, and an extended one when the
//! client asks to stay signed in. Because sessions carry no server-side
//! state, every authenticated request re-reads the account record, so a
//! banned or deleted account loses access immediately even with a live token.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::Email,
    error::{AuthError, CryptoError},
};

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - account email
    pub sub: String,
    /// Issued at in seconds (as UTC timestamp)
    pub iat: i64,
    /// Expiration time in seconds (as UTC timestamp)
    pub exp: i64,
}

/// A verified session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub email: Email,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC secret for signing and verifying.
    pub secret: Vec<u8>,
    /// Lifetime of a regular session.
    pub default_ttl: Duration,
    /// Lifetime when the client asks to stay signed in.
    pub extended_ttl: Duration,
}

impl SessionConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            default_ttl: Duration::hours(1),
            extended_ttl: Duration::days(30),
        }
    }
}

/// Issues and verifies session tokens.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
    extended_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            default_ttl: config.default_ttl,
            extended_ttl: config.extended_ttl,
        }
    }

    /// Issue a session for `email`, returning the session and its signed token.
    pub fn issue(&self, email: &Email, stay_signed_in: bool) -> Result<(Session, String), Error> {
        let ttl = if stay_signed_in {
            self.extended_ttl
        } else {
            self.default_ttl
        };

        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = SessionClaims {
            sub: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Crypto(CryptoError::JwtSigning(e.to_string())))?;

        Ok((
            Session {
                email: email.clone(),
                issued_at: now,
                expires_at,
            },
            token,
        ))
    }

    /// Verify a session token.
    ///
    /// Any failure (bad signature, expiry, malformed subject) collapses to
    /// `InvalidCredentials`: a caller presenting a broken session is simply
    /// not signed in.
    pub fn verify(&self, token: &str) -> Result<Session, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| Error::Auth(AuthError::InvalidCredentials))?;

        let email = Email::parse(&data.claims.sub)
            .map_err(|_| Error::Auth(AuthError::InvalidCredentials))?;

        let issued_at = Utc
            .timestamp_opt(data.claims.iat, 0)
            .single()
            .ok_or(AuthError::InvalidCredentials)?;
        let expires_at = Utc
            .timestamp_opt(data.claims.exp, 0)
            .single()
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(Session {
            email,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(SessionConfig::new(b"test-secret-key".to_vec()))
    }

    fn email() -> Email {
        Email::parse("alice@example.com").unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let (session, token) = issuer.issue(&email(), false).unwrap();

        let verified = issuer.verify(&token).unwrap();
        assert_eq!(verified.email, session.email);
        assert_eq!(
            verified.expires_at.timestamp(),
            session.expires_at.timestamp()
        );
    }

    #[test]
    fn test_stay_signed_in_extends_lifetime() {
        let issuer = issuer();
        let (short, _) = issuer.issue(&email(), false).unwrap();
        let (long, _) = issuer.issue(&email(), true).unwrap();
        assert!(long.expires_at > short.expires_at + Duration::days(1));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let issuer = issuer();
        let (_, token) = issuer.issue(&email(), false).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        assert!(matches!(
            issuer.verify(&tampered),
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = issuer();
        let (_, token) = issuer.issue(&email(), false).unwrap();

        let other = SessionIssuer::new(SessionConfig::new(b"other-secret".to_vec()));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let config = SessionConfig {
            secret: b"test-secret-key".to_vec(),
            default_ttl: Duration::seconds(-60),
            extended_ttl: Duration::days(30),
        };
        let issuer = SessionIssuer::new(config);
        let (_, token) = issuer.issue(&email(), false).unwrap();

        assert!(matches!(
            issuer.verify(&token),
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let issuer = issuer();
        assert!(issuer.verify("not-a-jwt").is_err());
        assert!(issuer.verify("").is_err());
    }
}
