/// Request authentication
///
/// Resolves the `Authorization: Bearer <token>` header into an
/// [`AuthContext`]: the token is verified statelessly, then the user it names
/// is loaded from the store so that the role used for authorization is the
/// current one.
///
/// The HTTP layer runs [`authenticate`] in a middleware and inserts the
/// context into request extensions; handlers take it as an extractor.
///
/// # Example
///
/// ```
/// use teamtask_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::{jwt::TokenIssuer, policy::Actor};
use crate::{models::UserProfile, store::Store};

/// Authenticated identity attached to a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Id and current role, for policy decisions
    pub actor: Actor,

    /// Profile of the authenticated user, for `/auth/me`
    pub user: UserProfile,
}

/// Error type for authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable `Authorization` header
    #[error("Not authorized, no token")]
    MissingCredentials,

    /// Token malformed, expired or badly signed
    #[error("Not authorized, token failed")]
    InvalidToken,

    /// Token is valid but its user no longer exists
    #[error("Not authorized, user not found")]
    UnknownUser,

    /// Store lookup failed
    #[error("Store error: {0}")]
    StoreError(String),
}

/// Renders `{ "success": false, "message": ... }`
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::StoreError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            other => (StatusCode::UNAUTHORIZED, other.to_string()),
        };

        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies the request's token and loads the acting user
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] without a bearer token
/// - [`AuthError::InvalidToken`] when verification fails
/// - [`AuthError::UnknownUser`] when the user was deleted after issuance
/// - [`AuthError::StoreError`] when the lookup itself fails
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenIssuer,
    store: &dyn Store,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingCredentials)?;

    let user_id = tokens.verify(token).ok_or(AuthError::InvalidToken)?;

    let user = store
        .find_user_by_id(user_id)
        .await
        .map_err(|e| AuthError::StoreError(e.to_string()))?
        .ok_or(AuthError::UnknownUser)?;

    Ok(AuthContext {
        actor: Actor::from(&user),
        user: user.profile(),
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{CreateUser, Role},
        store::{MemoryStore, UserStore},
    };
    use axum::http::HeaderValue;
    use chrono::Duration;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_authenticate_reads_current_role() {
        let store = MemoryStore::new();
        let tokens = TokenIssuer::new(SECRET, Duration::hours(1));
        let user = store
            .insert_user(CreateUser {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Manager,
            })
            .await
            .unwrap();

        let token = tokens.issue(user.id).unwrap();
        let headers = headers_with(&format!("Bearer {}", token));

        let ctx = authenticate(&headers, &tokens, &store).await.unwrap();
        assert_eq!(ctx.actor, Actor::new(user.id, Role::Manager));

        // Downgrade after issuance: the same token now acts as a regular user
        store
            .update_user(
                user.id,
                crate::models::UpdateUser {
                    role: Some(Role::User),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ctx = authenticate(&headers, &tokens, &store).await.unwrap();
        assert_eq!(ctx.actor.role, Role::User);
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let store = MemoryStore::new();
        let tokens = TokenIssuer::new(SECRET, Duration::hours(1));

        let err = authenticate(&HeaderMap::new(), &tokens, &store).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));

        let err = authenticate(&headers_with("Bearer garbage"), &tokens, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));

        let ghost = tokens.issue(Uuid::new_v4()).unwrap();
        let err = authenticate(&headers_with(&format!("Bearer {}", ghost)), &tokens, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownUser));
    }

    #[tokio::test]
    async fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Not authorized, no token");

        assert_eq!(
            AuthError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::StoreError("down".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
