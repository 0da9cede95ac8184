//! Input validation for emails and passwords
//!
//! Validation runs before any persistence or credential lookup, so malformed
//! requests are rejected without touching the store.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

/// Lazy-loaded email validation regex
///
/// Validates email addresses according to a practical subset of RFC 5322.
/// Loaded once at runtime and reused for all email validation operations.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Validates an email address
///
/// Returns `Ok(())` if the email is valid, or a `ValidationError::InvalidEmail`
/// if invalid.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

/// Password acceptance policy.
///
/// Length bounds plus required character classes. The same rules apply to
/// sign-up and to every password reset path.
#[derive(Debug, Clone)]
pub struct PasswordRules {
    pub min_length: usize,
    pub max_length: usize,
    pub require_letter: bool,
    pub require_digit: bool,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: true,
            require_digit: true,
        }
    }
}

impl PasswordRules {
    /// Validates a password against this policy
    ///
    /// Returns `Ok(())` if the password meets requirements, or a
    /// `ValidationError::InvalidPassword` if invalid.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        if password.trim().is_empty() {
            return Err(ValidationError::InvalidPassword(
                "Password is required".to_string(),
            ));
        }

        if password.len() < self.min_length {
            return Err(ValidationError::InvalidPassword(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if password.len() > self.max_length {
            return Err(ValidationError::InvalidPassword(format!(
                "Password must be no more than {} characters long",
                self.max_length
            )));
        }

        if self.require_letter && !password.chars().any(|c| c.is_alphabetic()) {
            return Err(ValidationError::InvalidPassword(
                "Password must contain at least one letter".to_string(),
            ));
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidPassword(
                "Password must contain at least one digit".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("test.email+tag@domain.co.uk").is_ok());
        assert!(validate_email("user123@test-domain.com").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@domain.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());

        // Test email too long
        let long_email = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long_email).is_err());
    }

    #[test]
    fn test_validate_password_valid() {
        let rules = PasswordRules::default();
        assert!(rules.validate("password123").is_ok());
        assert!(rules.validate("Passw0rd!").is_ok());
        assert!(rules.validate("abcdefg1").is_ok()); // Minimum length
    }

    #[test]
    fn test_validate_password_invalid() {
        let rules = PasswordRules::default();
        assert!(rules.validate("").is_err());
        assert!(rules.validate("   ").is_err()); // Whitespace only
        assert!(rules.validate("sh0rt").is_err()); // Too short
        assert!(rules.validate("12345678").is_err()); // No letter
        assert!(rules.validate("passwords").is_err()); // No digit
        assert!(rules.validate(&format!("a1{}", "a".repeat(127))).is_err()); // Too long
    }

    #[test]
    fn test_relaxed_rules() {
        let rules = PasswordRules {
            min_length: 4,
            max_length: 64,
            require_letter: false,
            require_digit: false,
        };
        assert!(rules.validate("1234").is_ok());
        assert!(rules.validate("abc").is_err());
    }
}
