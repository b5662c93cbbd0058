/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register and get a token
/// - `POST /api/auth/login` - Login and get a token
/// - `GET  /api/auth/me` - Current user
/// - `PUT  /api/auth/me` - Update own name or email

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    response::{ApiResponse, Created},
};
use axum::extract::State;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use teamtask_shared::{
    auth::middleware::AuthContext,
    error::CoreError,
    models::{UpdateUser, UserProfile},
};
use tracing::info;
use validator::Validate;

/// Register request
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, max = 30, message = "Password must be between 6 and 30 characters"))]
    pub password: String,
}

/// Login request
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide an email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide a password"))]
    pub password: String,
}

/// Own profile update
///
/// `role` and `password` are accepted by the parser only so that they can be
/// refused explicitly. They are `Some` whenever the key is present, even
/// with a `null` value.
#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub role: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub password: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Register and login response data
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: UserProfile,
    pub token: String,
}

fn issue(state: &AppState, user: UserProfile) -> ApiResult<AuthPayload> {
    let token = state.tokens.issue(user.id).map_err(CoreError::from)?;
    Ok(AuthPayload { user, token })
}

/// Register a new account
///
/// The first account ever registered becomes a manager; later ones are
/// regular users. A role in the body is ignored.
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Alice",
///   "email": "alice@example.com",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<Created<AuthPayload>> {
    req.validate()?;

    let user = state.users.register(req.name, req.email, req.password).await?;
    info!(user_id = %user.id, role = %user.role, "User registered");

    Ok(ApiResponse::created(issue(&state, user)?))
}

/// Login with email and password
///
/// # Errors
///
/// - `400 Bad Request`: Email or password missing
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    req.validate()?;

    let user = state.users.verify_credentials(&req.email, &req.password).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::data(issue(&state, user)?))
}

/// Current user, as loaded for this request
pub async fn me(auth: AuthContext) -> ApiResponse<UserProfile> {
    ApiResponse::data(auth.user)
}

/// Update own name or email
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, email in use, or the body tries
///   to change role or password
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<UserProfile>> {
    req.validate()?;

    if req.role.is_some() {
        return Err(ApiError::invalid_field("role", "Role can only be changed by a manager"));
    }
    if req.password.is_some() {
        return Err(ApiError::invalid_field("password", "Password cannot be changed here"));
    }

    let user = state
        .users
        .update(
            auth.actor.id,
            UpdateUser {
                name: req.name,
                email: req.email,
                role: None,
            },
        )
        .await?;

    Ok(ApiResponse::data(user))
}
