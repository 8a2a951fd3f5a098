//! Account routes: registration, login and self-service edits.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest,
    SocialLoginRequest, User,
};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let auth = AuthService::new(state.pool(), state.jwt());
    let response = auth.register(&body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.jwt());
    Ok(Json(auth.login(&body).await?))
}

/// POST /api/auth/social-login
#[instrument(skip_all)]
pub async fn social_login(
    State(state): State<AppState>,
    Json(body): Json<SocialLoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.jwt());
    Ok(Json(auth.social_login(&body).await?))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.jwt());
    Ok(Json(auth.me(user.id).await?))
}

/// GET /api/auth/check
///
/// Never fails: a missing or bad token reports `authenticated: false`.
pub async fn check(OptionalAuth(user): OptionalAuth) -> Json<Value> {
    match user {
        Some(user) => Json(json!({
            "authenticated": true,
            "user_id": user.id,
            "role": user.role,
            "seller_id": user.seller_id,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let auth = AuthService::new(state.pool(), state.jwt());
    Ok(Json(auth.update_profile(user.id, &body).await?))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    let auth = AuthService::new(state.pool(), state.jwt());
    auth.change_password(user.id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}
