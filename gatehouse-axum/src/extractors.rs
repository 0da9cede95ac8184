use axum::{
    Extension, RequestPartsExt,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use gatehouse_core::{Account, error::AuthError};

use crate::error::ApiError;

/// The signed-in account. Rejects with `InvalidCredentials` when the request
/// carries no valid session.
pub struct AuthAccount(pub Account);

impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(account): Extension<Account> = parts
            .extract()
            .await
            .map_err(|_| ApiError::from(AuthError::InvalidCredentials))?;

        Ok(AuthAccount(account))
    }
}

/// The signed-in account if there is one.
pub struct OptionalAuthAccount(pub Option<Account>);

impl<S> FromRequestParts<S> for OptionalAuthAccount
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = parts.extensions.get::<Account>().cloned();

        Ok(OptionalAuthAccount(account))
    }
}

/// The signed-in account, required to be an admin.
pub struct AdminAccount(pub Account);

impl<S> FromRequestParts<S> for AdminAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthAccount(account) = AuthAccount::from_request_parts(parts, state).await?;

        if !account.is_admin() {
            tracing::debug!(email = %account.email, "admin route refused");
            return Err(ApiError::Forbidden);
        }

        Ok(AdminAccount(account))
    }
}

