//! JWT Authentication Middleware
//!
//! Extracts the session JWT from the `session_token` cookie or the
//! Authorization header, validates it, loads the user and their groups, and
//! makes the result available to handlers via request extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use orderdesk_auth::{JwtValidator, SESSION_AUDIENCE, SESSION_ISSUER};
use orderdesk_db::entities::{user, user_group::Group, User};
use orderdesk_db::users;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated user context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    /// Group memberships at the time of the request
    pub groups: Vec<Group>,
}

/// State shared across middleware instances
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<JwtValidator>,
    pub db: DatabaseConnection,
}

impl AuthState {
    pub fn new(secret: &[u8], db: DatabaseConnection) -> Self {
        let validator = JwtValidator::new(secret)
            .with_issuer(SESSION_ISSUER.to_string())
            .with_audience(SESSION_AUDIENCE.to_string());

        Self {
            validator: Arc::new(validator),
            db,
        }
    }
}

/// Pull the session token out of the cookie header, falling back to
/// `Authorization: Bearer <token>`
fn extract_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let prefix = format!("{}=", SESSION_COOKIE);
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(|c| c.trim())
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .filter(|t| !t.is_empty());

    if let Some(token) = from_cookie {
        return Ok(token.to_string());
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized(
                "Missing authentication token (cookie or Authorization header)",
                "MISSING_AUTH",
            )
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
        .ok_or_else(|| {
            ApiError::unauthorized(
                "Invalid Authorization header format. Expected 'Bearer <token>'",
                "INVALID_AUTH_FORMAT",
            )
        })
}

/// Authentication middleware for protected routes
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - Both cookie and Authorization header are missing
/// - Token is malformed, invalid or expired
/// - Token type is not "session" or the `user_id` claim is missing
/// - The user no longer exists or is inactive
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())?;

    let claims = state.validator.validate(&token).map_err(|e| {
        ApiError::unauthorized(format!("Invalid or expired token: {}", e), "INVALID_TOKEN")
    })?;

    match claims.token_type.as_deref() {
        Some("session") => {}
        Some(other) => {
            return Err(ApiError::unauthorized(
                format!(
                    "Invalid token type '{}'. Expected 'session' token for API access",
                    other
                ),
                "INVALID_TOKEN_TYPE",
            ));
        }
        None => {
            return Err(ApiError::unauthorized(
                "Token missing 'token_type' claim",
                "MISSING_TOKEN_TYPE",
            ));
        }
    }

    let user_id = claims.user_id.ok_or_else(|| {
        ApiError::unauthorized("Token missing 'user_id' claim", "MISSING_USER_ID")
    })?;

    let account: Option<user::Model> = User::find_by_id(user_id).one(&state.db).await?;
    let account = match account {
        Some(account) if account.is_active => account,
        _ => {
            debug!("Rejecting token for missing or inactive user {}", user_id);
            return Err(ApiError::unauthorized(
                "User account is unavailable",
                "INACTIVE_USER",
            ));
        }
    };

    let groups = users::groups_of(&state.db, account.id).await?;

    request.extensions_mut().insert(AuthUser {
        user_id: account.id,
        username: account.username,
        groups,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorResponse;
    use axum::{body::Body, http::Request, http::StatusCode, middleware, routing::get, Json, Router};
    use chrono::Duration;
    use orderdesk_auth::JwtClaims;
    use sea_orm::Database;
    use tower::ServiceExt; // For oneshot()

    const SECRET: &[u8] = b"test-secret-key";

    async fn protected_handler(axum::Extension(user): axum::Extension<AuthUser>) -> Json<AuthUser> {
        Json(user)
    }

    async fn create_test_app() -> (Router, DatabaseConnection) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        orderdesk_db::migrate(&db).await.unwrap();

        let auth_state = Arc::new(AuthState::new(SECRET, db.clone()));
        let app = Router::new()
            .route("/protected", get(protected_handler))
            .layer(middleware::from_fn_with_state(auth_state, require_auth));

        (app, db)
    }

    async fn get_with(app: Router, header: (&str, String)) -> Response {
        app.oneshot(
            Request::builder()
                .uri("/protected")
                .header(header.0, header.1)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn error_of(response: Response) -> ErrorResponse {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_session_token() {
        let (app, db) = create_test_app().await;
        let account = users::create_user(&db, "employee1", "hash", &[Group::Employee])
            .await
            .unwrap();

        let claims = JwtClaims::session(account.id, "employee1", Duration::hours(1));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let auth_user: AuthUser = serde_json::from_slice(&body).unwrap();

        assert_eq!(auth_user.user_id, account.id);
        assert_eq!(auth_user.username, "employee1");
        assert_eq!(auth_user.groups, vec![Group::Employee]);
    }

    #[tokio::test]
    async fn test_auth_middleware_session_cookie() {
        let (app, db) = create_test_app().await;
        let account = users::create_user(&db, "customer1", "hash", &[Group::Customer])
            .await
            .unwrap();

        let claims = JwtClaims::session(account.id, "customer1", Duration::hours(1));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Cookie", format!("theme=dark; session_token={}", token))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_authorization_header() {
        let (app, _db) = create_test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/protected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_of(response).await;
        assert_eq!(error.code.as_deref(), Some("MISSING_AUTH"));
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_bearer_format() {
        let (app, _db) = create_test_app().await;

        let response = get_with(app, ("Authorization", "InvalidFormat token123".to_string())).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_of(response).await;
        assert!(error.error.contains("Invalid Authorization header format"));
    }

    #[tokio::test]
    async fn test_auth_middleware_expired_token() {
        let (app, db) = create_test_app().await;
        let account = users::create_user(&db, "customer1", "hash", &[Group::Customer])
            .await
            .unwrap();

        let claims = JwtClaims::session(account.id, "customer1", Duration::seconds(-120));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_of(response).await;
        assert!(error.error.contains("Invalid or expired token"));
    }

    #[tokio::test]
    async fn test_auth_middleware_wrong_secret() {
        let (app, db) = create_test_app().await;
        let account = users::create_user(&db, "customer1", "hash", &[Group::Customer])
            .await
            .unwrap();

        let claims = JwtClaims::session(account.id, "customer1", Duration::hours(1));
        let token = JwtValidator::encode(b"wrong-secret-key", &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_other_token_type() {
        let (app, db) = create_test_app().await;
        let account = users::create_user(&db, "customer1", "hash", &[Group::Customer])
            .await
            .unwrap();

        let claims = JwtClaims::session(account.id, "customer1", Duration::hours(1))
            .with_token_type("refresh".to_string());
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_of(response).await;
        assert!(error.error.contains("Invalid token type"));
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_user_id() {
        let (app, _db) = create_test_app().await;

        let claims = JwtClaims::new(
            "customer1".to_string(),
            SESSION_ISSUER.to_string(),
            SESSION_AUDIENCE.to_string(),
            Duration::hours(1),
        )
        .with_token_type("session".to_string());
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_of(response).await;
        assert!(error.error.contains("missing 'user_id' claim"));
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_sentinel_user() {
        let (app, db) = create_test_app().await;
        let sentinel = users::find_sentinel(&db).await.unwrap();

        let claims = JwtClaims::session(sentinel.id, &sentinel.username, Duration::hours(1));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = error_of(response).await;
        assert_eq!(error.code.as_deref(), Some("INACTIVE_USER"));
    }

    #[tokio::test]
    async fn test_auth_middleware_unknown_user() {
        let (app, _db) = create_test_app().await;

        let claims = JwtClaims::session(4242, "ghost", Duration::hours(1));
        let token = JwtValidator::encode(SECRET, &claims).unwrap();

        let response = get_with(app, ("Authorization", format!("Bearer {}", token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
