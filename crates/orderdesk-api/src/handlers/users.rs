use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orderdesk_auth::{check_password_policy, hash_password};
use orderdesk_db::entities::{self, user, user_group};
use orderdesk_db::users;
use sea_orm::{DbErr, EntityTrait, QueryOrder};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::access::Employee;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::models::*;
use crate::AppState;

/// List all users with their groups
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List of users", body = UserList),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Employees only", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
) -> ApiResult<Json<UserList>> {
    debug!("Listing users");

    let rows = entities::User::find()
        .order_by_asc(user::Column::Id)
        .find_with_related(entities::UserGroup)
        .all(&state.db)
        .await?;

    let users: Vec<User> = rows
        .into_iter()
        .map(|(account, memberships)| {
            let groups = memberships.into_iter().map(|m: user_group::Model| m.group).collect();
            User::from_model(account, groups)
        })
        .collect();
    let total = users.len();

    Ok(Json(UserList { users, total }))
}

/// Create a user with group memberships
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failed or username taken", body = ErrorResponse),
        (status = 403, description = "Employees only", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    check_password_policy(&req.password).map_err(|e| ApiError::field("password", e.to_string()))?;

    if users::find_by_username(&state.db, &req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(
            format!("Username '{}' is already taken", req.username),
            "USERNAME_EXISTS",
        ));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to hash password",
            "HASHING_ERROR",
        )
    })?;

    let groups: Vec<user_group::Group> = req.groups.iter().copied().map(Into::into).collect();
    let account = users::create_user(&state.db, &req.username, &password_hash, &groups).await?;
    let groups = users::groups_of(&state.db, account.id).await?;

    Ok((StatusCode::CREATED, Json(User::from_model(account, groups))))
}

/// Delete a user
///
/// Orders owned by the user are handed over to the reserved `deleted` user.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Employees only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "The reserved user cannot be deleted", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _employee: Employee,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    let sentinel = users::find_sentinel(&state.db).await?;
    if sentinel.id == id {
        return Err(ApiError::conflict(
            "The reserved user cannot be deleted",
            "SENTINEL_USER",
        ));
    }

    match users::delete_user(&state.db, id).await {
        Ok(reassigned) => {
            info!("User {} deleted, {} order(s) reassigned", id, reassigned);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(DbErr::RecordNotFound(_)) => Err(ApiError::not_found(
            format!("User {} not found", id),
            "USER_NOT_FOUND",
        )),
        Err(e) => Err(e.into()),
    }
}
