/// Task repository
///
/// Reads return [`TaskView`]s with both user references expanded. Writes
/// check that the referenced users exist before touching the store; the
/// store re-checks under its own atomicity (foreign keys or a write lock), so
/// an assignee deleted in between still aborts the write.

use std::{collections::HashMap, sync::Arc};

use tracing::info;
use uuid::Uuid;

use crate::{
    error::{CoreError, CoreResult},
    models::{NewTask, Task, TaskFilter, TaskPatch, TaskView, UserSummary},
    store::Store,
};

#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn Store>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Tasks matching `filter`, newest first, references expanded
    pub async fn list(&self, filter: TaskFilter) -> CoreResult<Vec<TaskView>> {
        let tasks = self.store.list_tasks(filter).await?;
        self.expand(tasks).await
    }

    /// Raw task row, for policy checks before a write
    pub async fn find(&self, id: Uuid) -> CoreResult<Task> {
        self.store
            .find_task(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Task not found"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> CoreResult<TaskView> {
        let task = self.find(id).await?;
        self.view(task).await
    }

    /// Creates a task with `created_by` forced to `actor_id`
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty title
    /// - `Integrity` if the assignee does not exist; nothing is written
    pub async fn create(&self, data: NewTask, actor_id: Uuid) -> CoreResult<TaskView> {
        if data.title.trim().is_empty() {
            return Err(CoreError::validation("Please add a task title"));
        }

        self.require_user(data.assigned_to, "User not found").await?;

        let task = self.store.insert_task(data.created_by(actor_id)).await?;
        info!(task_id = %task.id, assigned_to = %task.assigned_to, created_by = %actor_id, "Task created");

        self.view(task).await
    }

    /// Applies the fields present in `patch`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task does not exist
    /// - `Integrity` if a new assignee does not exist; nothing is written
    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> CoreResult<TaskView> {
        if let Some(assignee) = patch.assigned_to {
            self.require_user(assignee, "Assigned user not found").await?;
        }

        let reassigned = patch.assigned_to;
        let task = self
            .store
            .update_task(id, patch)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::Integrity(_) => CoreError::Integrity("Assigned user not found".to_string()),
                other => other,
            })?
            .ok_or_else(|| CoreError::not_found("Task not found"))?;

        if let Some(assignee) = reassigned {
            info!(task_id = %id, assigned_to = %assignee, "Task reassigned");
        }

        self.view(task).await
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        if !self.store.delete_task(id).await? {
            return Err(CoreError::not_found("Task not found"));
        }

        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    async fn require_user(&self, id: Uuid, message: &str) -> CoreResult<()> {
        match self.store.find_user_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::Integrity(message.to_string())),
        }
    }

    /// Expands one task row already loaded by the caller
    pub async fn view(&self, task: Task) -> CoreResult<TaskView> {
        let mut views = self.expand(vec![task]).await?;
        views
            .pop()
            .ok_or_else(|| CoreError::Internal("task expansion returned nothing".to_string()))
    }

    /// Replaces user ids with `{id, name, email}` using one lookup
    async fn expand(&self, tasks: Vec<Task>) -> CoreResult<Vec<TaskView>> {
        let mut ids: Vec<Uuid> = tasks
            .iter()
            .flat_map(|t| [t.assigned_to, t.created_by])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let users: HashMap<Uuid, UserSummary> = self
            .store
            .find_users_by_ids(&ids)
            .await?
            .iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| {
                let assigned_to = users.get(&task.assigned_to).cloned();
                let created_by = users.get(&task.created_by).cloned();
                TaskView::new(task, assigned_to, created_by)
            })
            .collect())
    }
}
