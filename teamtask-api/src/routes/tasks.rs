/// Task endpoints
///
/// Every handler consults the authorization policy with the actor loaded by
/// the auth middleware:
///
/// - Listings are filtered to the actor's visibility
/// - Reads and updates look the task up first, so an absent task is 404 and
///   a task assigned to someone else is 403
/// - Create and delete are refused for non-managers by
///   [`require_task_manager`](crate::middleware::auth::require_task_manager)
///   before the body or id is parsed, and again here

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    response::{ApiResponse, Created, Empty},
};
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Map, Value};
use teamtask_shared::{
    auth::{
        middleware::AuthContext,
        policy::{
            authorize_task_create, authorize_task_delete, authorize_task_read,
            authorize_task_update, task_visibility,
        },
    },
    models::{NewTask, TaskPatch, TaskStatus, TaskView},
};
use uuid::Uuid;

/// Create task request
///
/// Unknown keys, including `createdBy`, are ignored; the creator is always
/// the authenticated manager.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,

    pub description: Option<String>,

    pub status: Option<String>,

    pub assigned_to: Option<Uuid>,
}

impl CreateTaskRequest {
    fn into_new_task(self) -> ApiResult<NewTask> {
        if self.title.trim().is_empty() {
            return Err(ApiError::invalid_field("title", "Task title is required"));
        }

        let status = self
            .status
            .map(|s| s.parse::<TaskStatus>())
            .transpose()
            .map_err(|e| ApiError::invalid_field("status", e.to_string()))?;

        let assigned_to = self
            .assigned_to
            .ok_or_else(|| ApiError::invalid_field("assignedTo", "Task must be assigned to a user"))?;

        Ok(NewTask {
            title: self.title,
            description: self.description,
            status,
            assigned_to,
        })
    }
}

/// `GET /api/tasks`: all tasks for managers, own tasks otherwise
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<ApiResponse<Vec<TaskView>>> {
    let tasks = state.tasks.list(task_visibility(&auth.actor)).await?;
    Ok(ApiResponse::list(tasks))
}

/// `GET /api/tasks/status/:status`
///
/// # Errors
///
/// - `400 Bad Request`: Status outside the vocabulary
pub async fn list_tasks_by_status(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(status): ApiPath<String>,
) -> ApiResult<ApiResponse<Vec<TaskView>>> {
    let status: TaskStatus = status
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status value".to_string()))?;

    let filter = task_visibility(&auth.actor).with_status(status);
    let tasks = state.tasks.list(filter).await?;

    Ok(ApiResponse::list(tasks))
}

/// `GET /api/tasks/:id`
///
/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: Task is assigned to someone else
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = state.tasks.find(id).await?;
    authorize_task_read(&auth.actor, &task)?;

    Ok(ApiResponse::data(state.tasks.view(task).await?))
}

/// `POST /api/tasks` (managers)
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: application/json
///
/// {
///   "title": "Prepare release notes",
///   "description": "Cover the API changes",
///   "status": "en cours",
///   "assignedTo": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Actor is not a manager
/// - `400 Bad Request`: Missing title or assignee, unknown status
/// - `404 Not Found`: Assignee does not exist
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<Created<TaskView>> {
    authorize_task_create(&auth.actor)?;

    let task = state.tasks.create(req.into_new_task()?, auth.actor.id).await?;
    Ok(ApiResponse::created(task))
}

/// `PUT /api/tasks/:id`
///
/// The body is read as a JSON object so that the policy sees exactly which
/// keys were sent. A regular user may send `status` only, on a task assigned
/// to them; any other key rejects the whole update.
///
/// # Errors
///
/// - `404 Not Found`: No such task, or new assignee does not exist
/// - `403 Forbidden`: Not the assignee, or a field other than `status`
/// - `400 Bad Request`: Unknown field or invalid value
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = state.tasks.find(id).await?;
    authorize_task_update(&auth.actor, &task, body.keys().map(String::as_str))?;

    let patch = TaskPatch::from_json(&body)?;
    if patch.is_empty() {
        return Ok(ApiResponse::data(state.tasks.view(task).await?));
    }

    let updated = state.tasks.update(id, patch).await?;
    Ok(ApiResponse::data(updated))
}

/// `DELETE /api/tasks/:id` (managers)
///
/// # Errors
///
/// - `403 Forbidden`: Actor is not a manager
/// - `404 Not Found`: No such task
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Empty>> {
    authorize_task_delete(&auth.actor)?;

    state.tasks.delete(id).await?;
    Ok(ApiResponse::empty())
}
