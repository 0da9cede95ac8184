//! # Gatehouse Axum Integration
//!
//! Axum routes, middleware and extractors for the gatehouse account backend.
//! [`create_router`] builds the complete HTTP surface (sign-up, sign-in,
//! sign-out, ping, email confirmation, password reset, secret rotation and
//! the admin endpoints) on top of a [`gatehouse_core::Auth`] facade.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatehouse_core::{
//!     Auth, EmailFactory, LogMailer, MemoryStore, SessionConfig, SessionIssuer,
//! };
//! use gatehouse_axum::{CookieConfig, create_router};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let auth = Arc::new(Auth::new(
//!         store,
//!         SessionIssuer::new(SessionConfig::new(b"change-me".to_vec())),
//!         Arc::new(LogMailer),
//!         EmailFactory::new("http://localhost:5173"),
//!     ));
//!
//!     let app = create_router(auth, CookieConfig::development());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod types;

pub use error::{ApiError, Result};
pub use extractors::{AdminAccount, AuthAccount, OptionalAuthAccount};
pub use middleware::{AuthState, auth_middleware};
pub use routes::create_router;
pub use types::{CookieConfig, CookieSameSite};
