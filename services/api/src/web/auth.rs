//! services/api/src/web/auth.rs
//!
//! Session endpoints. Sign-in happens at the external OAuth provider, which
//! writes the auth session; this service only reads and ends it.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::web::dto::UserResponse;
use crate::web::middleware::{session_token, SESSION_COOKIE};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

/// POST /auth/logout - Invalidate the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let auth_session_id = session_token(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
        })?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/me - The signed-in user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Session user has no profile")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<UserResponse>, HandlerError> {
    let profile = state
        .db
        .get_user_profiles(&[user_id])
        .await
        .map_err(port_error)?
        .into_iter()
        .next()
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("User {} not found", user_id)))?;
    info!("Resolved session user {}", user_id);
    Ok(Json(profile.into()))
}
