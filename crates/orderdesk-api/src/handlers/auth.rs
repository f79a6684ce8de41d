use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use orderdesk_auth::{verify_password, JwtClaims, JwtValidator};
use orderdesk_db::{entities, users};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::middleware::{AuthUser, SESSION_COOKIE};
use crate::models::*;
use crate::AppState;

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid username or password", "INVALID_CREDENTIALS")
}

/// Log in with username and password
///
/// Returns a session token in the body and as an HttpOnly cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("Login attempt for '{}'", req.username);

    let account = users::find_by_username(&state.db, &req.username)
        .await?
        .filter(|account| account.is_active)
        .ok_or_else(invalid_credentials)?;

    // Unparsable stored hashes count as a mismatch
    let valid = verify_password(&req.password, &account.password_hash).unwrap_or(false);
    if !valid {
        warn!("Failed login for '{}'", req.username);
        return Err(invalid_credentials());
    }

    let groups = users::groups_of(&state.db, account.id).await?;

    let claims = JwtClaims::session(account.id, &account.username, state.session_ttl);
    let token = JwtValidator::encode(state.jwt_secret.as_bytes(), &claims).map_err(|e| {
        error!("Failed to issue session token: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue session token",
            "TOKEN_ERROR",
        )
    })?;

    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        state.session_ttl.num_seconds()
    );

    info!("User '{}' logged in", account.username);

    let response = LoginResponse {
        expires_at: claims.expires_at(),
        user: User::from_model(account, groups),
        token,
    };

    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(response)))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    let cookie = format!(
        "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    );
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
    )
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let account = entities::User::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found", "USER_NOT_FOUND"))?;

    Ok(Json(User::from_model(account, auth_user.groups)))
}
