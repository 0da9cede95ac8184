use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Account not found")]
    MissingAccount,

    #[error("No more login attempts ({attempts}/{max_attempts})")]
    NoMoreLoginAttempts { attempts: u32, max_attempts: u32 },
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Missing token")]
    Missing,

    #[error("Invalid token")]
    Invalid,

    #[error("Expired token")]
    Expired,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("JWT signing failed: {0}")]
    JwtSigning(String),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Message could not be built: {0}")]
    Build(String),

    #[error("Message could not be sent: {0}")]
    Send(String),
}

impl Error {
    /// The stable numeric code exposed to API clients, if this error maps to one.
    ///
    /// Server-side faults (storage, crypto, mail) intentionally carry no code
    /// and surface as a generic internal error at the HTTP boundary.
    pub fn client_code(&self) -> Option<i32> {
        match self {
            Error::Validation(ValidationError::InvalidEmail(_)) => Some(-100),
            Error::Validation(ValidationError::InvalidPassword(_)) => Some(-101),
            Error::Token(TokenError::Invalid) => Some(-102),
            Error::Token(TokenError::Missing) => Some(-103),
            Error::Token(TokenError::Expired) => Some(-104),
            Error::Auth(AuthError::UserAlreadyExists) => Some(-200),
            Error::Auth(AuthError::InvalidCredentials) => Some(-201),
            Error::Auth(AuthError::NoMoreLoginAttempts { .. }) => Some(-202),
            Error::Auth(AuthError::MissingAccount) => Some(-203),
            _ => None,
        }
    }

    /// The stable symbolic tag exposed to API clients, if this error maps to one.
    pub fn client_tag(&self) -> Option<&'static str> {
        match self {
            Error::Validation(ValidationError::InvalidEmail(_)) => Some("InvalidEmail"),
            Error::Validation(ValidationError::InvalidPassword(_)) => Some("InvalidPassword"),
            Error::Token(TokenError::Invalid) => Some("InvalidToken"),
            Error::Token(TokenError::Missing) => Some("MissingToken"),
            Error::Token(TokenError::Expired) => Some("ExpiredToken"),
            Error::Auth(AuthError::UserAlreadyExists) => Some("UserAlreadyExists"),
            Error::Auth(AuthError::InvalidCredentials) => Some("InvalidCredentials"),
            Error::Auth(AuthError::NoMoreLoginAttempts { .. }) => Some("NoMoreLoginAttempts"),
            Error::Auth(AuthError::MissingAccount) => Some("MissingAccount"),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Crypto(_) | Error::Mail(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let auth_error = Error::Auth(AuthError::InvalidCredentials);
        assert_eq!(
            auth_error.to_string(),
            "Authentication error: Invalid credentials"
        );

        let validation_error =
            Error::Validation(ValidationError::InvalidEmail("test@".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Invalid email format: test@"
        );

        let token_error = Error::Token(TokenError::Expired);
        assert_eq!(token_error.to_string(), "Token error: Expired token");
    }

    #[test]
    fn test_client_codes_are_stable() {
        let cases: Vec<(Error, i32, &str)> = vec![
            (
                ValidationError::InvalidEmail("x".into()).into(),
                -100,
                "InvalidEmail",
            ),
            (
                ValidationError::InvalidPassword("short".into()).into(),
                -101,
                "InvalidPassword",
            ),
            (TokenError::Invalid.into(), -102, "InvalidToken"),
            (TokenError::Missing.into(), -103, "MissingToken"),
            (TokenError::Expired.into(), -104, "ExpiredToken"),
            (AuthError::UserAlreadyExists.into(), -200, "UserAlreadyExists"),
            (
                AuthError::InvalidCredentials.into(),
                -201,
                "InvalidCredentials",
            ),
            (
                AuthError::NoMoreLoginAttempts {
                    attempts: 5,
                    max_attempts: 5,
                }
                .into(),
                -202,
                "NoMoreLoginAttempts",
            ),
            (AuthError::MissingAccount.into(), -203, "MissingAccount"),
        ];

        for (error, code, tag) in cases {
            assert_eq!(error.client_code(), Some(code), "{error}");
            assert_eq!(error.client_tag(), Some(tag), "{error}");
        }
    }

    #[test]
    fn test_internal_errors_have_no_client_code() {
        let storage = Error::Storage(StorageError::Backend("disk on fire".to_string()));
        assert_eq!(storage.client_code(), None);
        assert_eq!(storage.client_tag(), None);
        assert!(storage.is_internal());

        let crypto = Error::Crypto(CryptoError::PasswordHash("bad params".to_string()));
        assert_eq!(crypto.client_code(), None);
        assert!(crypto.is_internal());
    }

    #[test]
    fn test_error_from_conversions() {
        let auth_error = AuthError::InvalidCredentials;
        let error: Error = auth_error.into();
        assert!(matches!(error, Error::Auth(AuthError::InvalidCredentials)));

        let token_error = TokenError::Missing;
        let error: Error = token_error.into();
        assert!(matches!(error, Error::Token(TokenError::Missing)));
    }
}
