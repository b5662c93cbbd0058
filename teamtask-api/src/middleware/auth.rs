/// Authentication middleware
///
/// [`require_auth`] resolves the bearer token into an [`AuthContext`] and
/// stores it in the request extensions, where handlers pick it up as an
/// extractor. [`require_manager`] and [`require_task_manager`] must run after
/// it, and before any body or path extraction.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use teamtask_shared::auth::{
    middleware::{authenticate, AuthContext, AuthError},
    policy::{authorize_task_create, authorize_task_delete, authorize_user_management, Actor},
};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

/// Rejects requests without a valid token for an existing user
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = authenticate(req.headers(), &state.tokens, state.store.as_ref()).await?;

    debug!(user_id = %ctx.actor.id, role = %ctx.actor.role, "Request authenticated");
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Rejects authenticated non-managers with 403
pub async fn require_manager(req: Request, next: Next) -> Result<Response, ApiError> {
    authorize_user_management(&request_actor(&req)?)?;

    Ok(next.run(req).await)
}

/// Rejects non-managers on task creation (POST) and deletion (DELETE) with
/// 403, so that a malformed body or id never turns into a 400 first
pub async fn require_task_manager(req: Request, next: Next) -> Result<Response, ApiError> {
    let actor = request_actor(&req)?;

    match *req.method() {
        Method::POST => authorize_task_create(&actor)?,
        Method::DELETE => authorize_task_delete(&actor)?,
        _ => {}
    }

    Ok(next.run(req).await)
}

fn request_actor(req: &Request) -> Result<Actor, AuthError> {
    req.extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.actor)
        .ok_or(AuthError::MissingCredentials)
}
