use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use gatehouse_core::{AccountKind, Auth, Email, KvStore};

use crate::{
    error::Result,
    extractors::{AdminAccount, AuthAccount, OptionalAuthAccount},
    middleware::{AuthState, auth_middleware},
    types::*,
};

pub fn create_router<S>(auth: Arc<Auth<S>>, cookie_config: CookieConfig) -> Router
where
    S: KvStore,
{
    let state = AuthState {
        auth,
        cookie: cookie_config,
    };

    let account_routes = Router::new()
        .route("/sign-up", post(sign_up_handler))
        .route("/sign-in", post(sign_in_handler))
        .route("/sign-out", post(sign_out_handler))
        .route("/ping", get(ping_handler))
        .route("/confirm-email", post(confirm_email_handler))
        .route("/forgot-password", post(forgot_password_handler))
        .route("/reset-password", post(reset_password_handler))
        .route("/reset-password/check", post(check_reset_token_handler))
        .route("/secret/renew", post(renew_secret_handler));

    let admin_routes = Router::new()
        .route("/admin/users/ban", post(ban_handler))
        .route("/admin/users/unban", post(unban_handler))
        .route("/admin/users/favorite", post(favorite_handler))
        .route("/admin/users/unfavorite", post(unfavorite_handler))
        .route("/admin/users/confirm", post(confirm_handler))
        .route("/admin/users/unconfirm", post(unconfirm_handler))
        .route("/admin/users/promote", post(promote_handler))
        .route("/admin/users/demote", post(demote_handler))
        .route("/admin/users", delete(delete_user_handler));

    Router::new()
        .merge(account_routes)
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ))
        .with_state(state)
}

async fn sign_up_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    state.auth.sign_up(&payload.email, &payload.password).await?;

    Ok(Json(MessageResponse {
        message: "Account created, confirmation email sent".to_string(),
    }))
}

async fn sign_in_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let (account, _session, token) = state
        .auth
        .sign_in(&payload.email, &payload.password, payload.stay_signed_in)
        .await?;

    let cookie_config = &state.cookie;
    let same_site = match cookie_config.same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    };

    let cookie = Cookie::build((cookie_config.name.clone(), token))
        .path(cookie_config.path.clone())
        .http_only(cookie_config.http_only)
        .secure(cookie_config.secure)
        .same_site(same_site);

    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(SessionUserResponse {
            email: account.email.to_string(),
            is_admin: account.is_admin(),
        }),
    ))
}

async fn sign_out_handler<S>(
    State(state): State<AuthState<S>>,
    AuthAccount(account): AuthAccount,
    jar: CookieJar,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    tracing::info!(email = %account.email, "signed out");

    let removal = Cookie::build(state.cookie.name.clone())
        .path(state.cookie.path.clone())
        .build();
    let jar = jar.remove(removal);

    Ok((
        jar,
        Json(MessageResponse {
            message: "Signed out".to_string(),
        }),
    ))
}

async fn ping_handler(AuthAccount(account): AuthAccount) -> Result<impl IntoResponse> {
    Ok(Json(SessionUserResponse {
        email: account.email.to_string(),
        is_admin: account.is_admin(),
    }))
}

async fn confirm_email_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    state.auth.confirm_email(payload.token.as_deref()).await?;

    Ok(Json(MessageResponse {
        message: "Email confirmed".to_string(),
    }))
}

async fn forgot_password_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    state.auth.forgot_password(&payload.email).await?;

    Ok(Json(MessageResponse {
        message: "Password reset email sent".to_string(),
    }))
}

async fn check_reset_token_handler<S>(
    State(state): State<AuthState<S>>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    state
        .auth
        .check_reset_token(payload.token.as_deref())
        .await?;

    Ok(Json(MessageResponse {
        message: "Token is valid".to_string(),
    }))
}

async fn reset_password_handler<S>(
    State(state): State<AuthState<S>>,
    OptionalAuthAccount(account): OptionalAuthAccount,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let authenticated = account.as_ref().map(|account| &account.email);
    state
        .auth
        .reset_password(payload.token.as_deref(), authenticated, &payload.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

async fn renew_secret_handler<S>(
    State(state): State<AuthState<S>>,
    AuthAccount(account): AuthAccount,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let secret = state.auth.renew_secret(&account.email).await?;

    Ok(Json(SecretResponse { secret }))
}

/// Parses the email of an admin edit request, surfacing validation errors in
/// the standard envelope.
fn target_email(payload: &EmailRequest) -> Result<Email> {
    Ok(Email::parse(&payload.email).map_err(gatehouse_core::Error::from)?)
}

async fn ban_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_banned(&email, true).await?;

    tracing::info!(admin = %admin.email, target = %email, "user banned");
    Ok(Json(MessageResponse {
        message: "User banned".to_string(),
    }))
}

async fn unban_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_banned(&email, false).await?;

    tracing::info!(admin = %admin.email, target = %email, "user unbanned");
    Ok(Json(MessageResponse {
        message: "User unbanned".to_string(),
    }))
}

async fn favorite_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(_admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_favorited(&email, true).await?;

    Ok(Json(MessageResponse {
        message: "User favorited".to_string(),
    }))
}

async fn unfavorite_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(_admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_favorited(&email, false).await?;

    Ok(Json(MessageResponse {
        message: "User unfavorited".to_string(),
    }))
}

async fn confirm_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(_admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_confirmed(&email, true).await?;

    Ok(Json(MessageResponse {
        message: "User confirmed".to_string(),
    }))
}

async fn unconfirm_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(_admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_confirmed(&email, false).await?;

    Ok(Json(MessageResponse {
        message: "User unconfirmed".to_string(),
    }))
}

async fn promote_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_kind(&email, AccountKind::Admin).await?;

    tracing::info!(admin = %admin.email, target = %email, "user promoted");
    Ok(Json(MessageResponse {
        message: "User promoted".to_string(),
    }))
}

async fn demote_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.set_kind(&email, AccountKind::Regular).await?;

    tracing::info!(admin = %admin.email, target = %email, "user demoted");
    Ok(Json(MessageResponse {
        message: "User demoted".to_string(),
    }))
}

async fn delete_user_handler<S>(
    State(state): State<AuthState<S>>,
    AdminAccount(admin): AdminAccount,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse>
where
    S: KvStore,
{
    let email = target_email(&payload)?;
    state.auth.delete_account(&email).await?;

    tracing::info!(admin = %admin.email, target = %email, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}
