//! Core functionality for the gatehouse account backend
//!
//! This crate owns the account, credential and session lifecycle: password
//! hashing and policy, sign-in with attempt lockout, stateless JWT sessions,
//! single-use email confirmation and password reset tokens, the rotating
//! per-account admin secret, and the administrative account edits.
//!
//! Everything persists through the [`store::KvStore`] trait; [`auth::Auth`]
//! is the facade the HTTP layer talks to.

pub mod account;
pub mod auth;
pub mod error;
pub mod id;
pub mod lockout;
pub mod mailer;
pub mod password;
pub mod session;
pub mod store;
pub mod token;
pub mod validation;

pub use account::{Account, AccountKind, Email};
pub use auth::{Auth, AuthConfig};
pub use error::Error;
pub use lockout::{LockoutConfig, LoginLimiter};
pub use mailer::{EmailFactory, EmailMessage, LogMailer, Mailer};
pub use password::{HashCost, PasswordEngine};
pub use session::{Session, SessionConfig, SessionIssuer};
pub use store::{KvStore, MemoryStore};
pub use token::{Token, TokenPurpose};
