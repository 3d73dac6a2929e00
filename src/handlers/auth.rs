use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use garde::Validate;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::{MaybeSession, RequireSession, SessionCookies},
    models::session::SessionPayload,
    models::user::AuthUser,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    SessionCookies(cookies): SessionCookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    payload.validate()?;

    let user = auth_service::register_user(
        state.users.as_ref(),
        &payload.full_name,
        &payload.email,
        &payload.password,
    )
    .await?;

    state.sessions.create_session(&cookies, &user)?;
    tracing::info!("✅ User registered: {}", user.id);

    let response = AuthResponse {
        success: true,
        message: "Registration successful. Welcome!".to_string(),
        user: Some(AuthUser::from(&user)),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    SessionCookies(cookies): SessionCookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    payload.validate()?;

    let user =
        auth_service::authenticate_user(state.users.as_ref(), &payload.email, &payload.password)
            .await?;

    state.sessions.create_session(&cookies, &user)?;
    tracing::info!("✅ User logged in: {}", user.id);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: Some(AuthUser::from(&user)),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout. Succeeds with or without an active session.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    SessionCookies(cookies): SessionCookies,
) -> Result<Response> {
    state.sessions.destroy_session(&cookies);

    match session {
        Some(session) => tracing::info!("👋 User logged out: {}", session.user_id),
        None => tracing::debug!("Logout without an active session"),
    }

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
        user: None,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Renews the session cookie (sliding expiration).
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    SessionCookies(cookies): SessionCookies,
) -> Result<Json<SessionPayload>> {
    state
        .sessions
        .refresh_session(&cookies)?
        .map(Json)
        .ok_or_else(|| AppError::Authentication("No active session".to_string()))
}

/// Returns the current session payload or `null`.
pub async fn session(MaybeSession(session): MaybeSession) -> Json<Option<SessionPayload>> {
    Json(session)
}

/// Returns the signed-in user's profile; redirects to login without a session.
pub async fn me(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Json<Option<AuthUser>> {
    Json(auth_service::current_user(state.users.as_ref(), &session).await)
}
