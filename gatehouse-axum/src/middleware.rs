use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use gatehouse_core::{Account, Auth, KvStore};

use crate::types::CookieConfig;

pub struct AuthState<S: KvStore> {
    pub auth: Arc<Auth<S>>,
    pub cookie: CookieConfig,
}

impl<S: KvStore> Clone for AuthState<S> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            cookie: self.cookie.clone(),
        }
    }
}

/// Resolve the session cookie to a live account and stash it in the request
/// extensions. The account is re-read from the store on every request, so a
/// ban or deletion takes effect immediately regardless of token lifetime.
pub async fn auth_middleware<S>(
    State(state): State<AuthState<S>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    S: KvStore,
{
    request.extensions_mut().insert(None::<Account>);

    let session_token = jar
        .get(&state.cookie.name)
        .map(|cookie| cookie.value().to_string());

    if let Some(session_token) = session_token {
        match state.auth.authenticate(Some(&session_token)).await {
            Ok(account) => {
                request.extensions_mut().insert(account.clone());
                request.extensions_mut().insert(Some(account));
            }
            Err(e) => {
                tracing::debug!("invalid session: {:?}", e);
            }
        }
    }

    next.run(request).await
}
