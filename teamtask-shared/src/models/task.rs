/// Task model
///
/// A task is assigned to exactly one user and remembers the manager who
/// created it. Both references must point at existing users when the task
/// is written.
///
/// # Status
///
/// ```text
/// "à faire" (default) → "en cours" → "terminée"
/// ```
///
/// Any status may be set from any other; the vocabulary is a closed set,
/// not a state machine.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status TEXT NOT NULL DEFAULT 'à faire',
///     assigned_to UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE INDEX idx_tasks_assigned_to_status ON tasks(assigned_to, status);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::user::UserSummary;

/// Task progress status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "à faire")]
    Todo,

    #[serde(rename = "en cours")]
    InProgress,

    #[serde(rename = "terminée")]
    Done,
}

/// Error returned for a status string outside the closed vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Status must be one of: à faire, en cours, terminée")]
pub struct UnknownStatus(pub String);

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Converts status to its wire and storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "à faire",
            TaskStatus::InProgress => "en cours",
            TaskStatus::Done => "terminée",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stored task row with unexpanded references
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    /// User the task is assigned to
    pub assigned_to: Uuid,

    /// Manager who created the task
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task as returned by the API, with both references expanded
///
/// A reference whose user no longer exists expands to `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    pub fn new(
        task: Task,
        assigned_to: Option<UserSummary>,
        created_by: Option<UserSummary>,
    ) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            assigned_to,
            created_by,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Input for inserting a task row
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Uuid,
    pub created_by: Uuid,
}

/// Task data supplied by a manager; the creator is filled in from the actor
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Uuid,
}

impl NewTask {
    /// Binds this input to its creator
    pub fn created_by(self, actor_id: Uuid) -> CreateTask {
        CreateTask {
            title: self.title.trim().to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            status: self.status.unwrap_or_default(),
            assigned_to: self.assigned_to,
            created_by: actor_id,
        }
    }
}

/// Writable task fields, named as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Description,
    Status,
    AssignedTo,
}

impl TaskField {
    pub const ALL: [TaskField; 4] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::Status,
        TaskField::AssignedTo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Status => "status",
            TaskField::AssignedTo => "assignedTo",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        TaskField::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

/// Error raised while reading an update body into a [`TaskPatch`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Key is not a writable task field
    #[error("Field '{0}' cannot be updated")]
    UnknownField(String),

    /// Key is writable but its value is unusable
    #[error("{field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Partial task update
///
/// Only fields present in the request body are `Some`. `description` uses a
/// nested option so that an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
}

impl TaskPatch {
    /// Reads a JSON object body, keeping track of which keys were present
    ///
    /// # Errors
    ///
    /// - [`PatchError::UnknownField`] for any key that is not a writable field
    /// - [`PatchError::InvalidValue`] for an empty title, an unknown status,
    ///   or an assignee that is not a UUID
    pub fn from_json(body: &Map<String, JsonValue>) -> Result<Self, PatchError> {
        let mut patch = TaskPatch::default();

        for (key, value) in body {
            let field =
                TaskField::from_key(key).ok_or_else(|| PatchError::UnknownField(key.clone()))?;

            match field {
                TaskField::Title => {
                    let title = value
                        .as_str()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .ok_or_else(|| PatchError::InvalidValue {
                            field: "title",
                            message: "Please add a task title".to_string(),
                        })?;
                    patch.title = Some(title.to_string());
                }
                TaskField::Description => {
                    patch.description = match value {
                        JsonValue::Null => Some(None),
                        JsonValue::String(s) => Some(Some(s.trim().to_string())),
                        _ => {
                            return Err(PatchError::InvalidValue {
                                field: "description",
                                message: "Description must be a string".to_string(),
                            })
                        }
                    };
                }
                TaskField::Status => {
                    let raw = value.as_str().unwrap_or_default();
                    let status = raw.parse::<TaskStatus>().map_err(|e| PatchError::InvalidValue {
                        field: "status",
                        message: e.to_string(),
                    })?;
                    patch.status = Some(status);
                }
                TaskField::AssignedTo => {
                    let assignee = value
                        .as_str()
                        .and_then(|s| Uuid::parse_str(s).ok())
                        .ok_or_else(|| PatchError::InvalidValue {
                            field: "assignedTo",
                            message: "Task must be assigned to a valid user id".to_string(),
                        })?;
                    patch.assigned_to = Some(assignee);
                }
            }
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields this patch would write
    pub fn fields(&self) -> Vec<TaskField> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push(TaskField::Title);
        }
        if self.description.is_some() {
            fields.push(TaskField::Description);
        }
        if self.status.is_some() {
            fields.push(TaskField::Status);
        }
        if self.assigned_to.is_some() {
            fields.push(TaskField::AssignedTo);
        }
        fields
    }

    /// Applies the patch to a task in place, bumping `updated_at`
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assignee) = self.assigned_to {
            task.assigned_to = assignee;
        }
        task.updated_at = Utc::now();
    }
}

/// Selection criteria for listing tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks assigned to this user
    pub assigned_to: Option<Uuid>,

    /// Only tasks with this status
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.assigned_to.map_or(true, |id| task.assigned_to == id)
            && self.status.map_or(true, |s| task.status == s)
    }
}
