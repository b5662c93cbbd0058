/// User management endpoints
///
/// Mounted behind `require_manager`; regular users never reach these
/// handlers. Passwords are set at creation only: an update body carrying a
/// `password` key has it dropped.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    response::{ApiResponse, Created, Empty},
};
use axum::extract::State;
use serde::Deserialize;
use teamtask_shared::{
    auth::{middleware::AuthContext, policy::authorize_user_delete},
    models::{Role, UpdateUser, UserProfile},
    repository::NewUser,
};
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, max = 30, message = "Password must be between 6 and 30 characters"))]
    pub password: String,

    /// Defaults to `user`
    pub role: Option<Role>,
}

/// Update user request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub role: Option<Role>,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<UserProfile>>> {
    Ok(ApiResponse::list(state.users.list().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<UserProfile>> {
    Ok(ApiResponse::data(state.users.get(id).await?))
}

/// `POST /api/users`
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<Created<UserProfile>> {
    req.validate()?;

    let user = state
        .users
        .create(NewUser {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role.unwrap_or_default(),
        })
        .await?;

    Ok(ApiResponse::created(user))
}

/// `PUT /api/users/:id`
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `400 Bad Request`: Validation failed or email in use
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<ApiResponse<UserProfile>> {
    req.validate()?;

    let user = state
        .users
        .update(
            id,
            UpdateUser {
                name: req.name,
                email: req.email,
                role: req.role,
            },
        )
        .await?;

    Ok(ApiResponse::data(user))
}

/// `DELETE /api/users/:id`
///
/// # Errors
///
/// - `404 Not Found`: No such user
/// - `400 Bad Request`: Deleting oneself, or the user still has tasks
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Empty>> {
    state.users.get(id).await?;
    authorize_user_delete(&auth.actor, id)?;

    state.users.delete(id).await?;
    Ok(ApiResponse::empty())
}
