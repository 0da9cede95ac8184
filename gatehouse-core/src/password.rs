//! Password hashing and verification
//!
//! Passwords are hashed with Argon2id using a per-password random salt. The
//! encoded hash carries its own parameters, so verification keeps working
//! after the cost configuration changes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::{
    Error,
    account::PasswordHash,
    error::{CryptoError, ValidationError},
    validation::PasswordRules,
};

/// Argon2id cost parameters.
#[derive(Debug, Clone)]
pub struct HashCost {
    /// Memory usage in KiB.
    pub memory_kib: u32,
    /// Number of iterations.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        // OWASP-recommended Argon2id baseline
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hashes and verifies passwords and enforces the acceptance policy.
#[derive(Debug, Clone)]
pub struct PasswordEngine {
    rules: PasswordRules,
    cost: HashCost,
}

impl Default for PasswordEngine {
    fn default() -> Self {
        Self::new(PasswordRules::default(), HashCost::default())
    }
}

impl PasswordEngine {
    pub fn new(rules: PasswordRules, cost: HashCost) -> Self {
        Self { rules, cost }
    }

    /// Validate a candidate password against the acceptance policy.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        self.rules.validate(password)
    }

    fn hasher(&self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(
            self.cost.memory_kib,
            self.cost.iterations,
            self.cost.parallelism,
            None,
        )
        .map_err(|e| Error::Crypto(CryptoError::PasswordHash(e.to_string())))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let encoded = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Crypto(CryptoError::PasswordHash(e.to_string())))?
            .to_string();

        Ok(PasswordHash::new(encoded))
    }

    /// Verify a candidate password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only for malformed hashes.
    pub fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, Error> {
        let parsed = PhcHash::new(hash.as_str())
            .map_err(|e| Error::Crypto(CryptoError::PasswordHash(e.to_string())))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let engine = PasswordEngine::default();
        let hash = engine.hash("correct horse 1").unwrap();

        assert!(engine.verify("correct horse 1", &hash).unwrap());
        assert!(!engine.verify("wrong horse 1", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let engine = PasswordEngine::default();
        let first = engine.hash("correct horse 1").unwrap();
        let second = engine.hash("correct horse 1").unwrap();
        assert_ne!(first.as_str(), second.as_str());
    }

    #[test]
    fn test_hash_is_phc_encoded() {
        let engine = PasswordEngine::default();
        let hash = engine.hash("correct horse 1").unwrap();
        assert!(hash.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_survives_cost_change() {
        let old = PasswordEngine::new(
            PasswordRules::default(),
            HashCost {
                memory_kib: 8 * 1024,
                iterations: 1,
                parallelism: 1,
            },
        );
        let hash = old.hash("correct horse 1").unwrap();

        // A new engine with different costs still verifies old hashes
        let new = PasswordEngine::default();
        assert!(new.verify("correct horse 1", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let engine = PasswordEngine::default();
        let garbage = PasswordHash::new("not a phc string".to_string());
        assert!(engine.verify("anything1", &garbage).is_err());
    }

    #[test]
    fn test_policy_enforcement() {
        let engine = PasswordEngine::default();
        assert!(engine.validate("Passw0rd!").is_ok());
        assert!(engine.validate("short1").is_err());
    }
}
