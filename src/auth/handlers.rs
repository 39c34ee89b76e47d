use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    claims::TokenKind,
    credentials::{check_password_strength, hash_password, normalize_email, verify_password},
    dto::{AuthResponse, CredentialsRequest, PublicUser, RefreshRequest},
    jwt::{AuthUser, JwtKeys},
    repo::User,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email)?;
    check_password_strength(&payload.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    // the lookup above can race another registration; the insert is authoritative
    let Some(user) = state.users.create(&email, &hash).await? else {
        warn!(%email, "email registered concurrently");
        return Err(AppError::Conflict("email already registered".into()));
    };

    info!(user_id = %user.id, %email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email)?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login for unknown email");
        return Err(AppError::unauthorized("invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login with wrong password");
        return Err(AppError::unauthorized("invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let claims = JwtKeys::from_ref(&state)
        .verify(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("user not found"))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("user not found"))?;

    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}
