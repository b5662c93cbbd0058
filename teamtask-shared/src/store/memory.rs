/// In-memory store
///
/// Keeps users and tasks in insertion order behind a single
/// `tokio::sync::RwLock`. Every write validates its references and applies
/// its change under the same write guard, so a check-then-write can never
/// interleave with a concurrent delete.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{CreateTask, CreateUser, Role, Task, TaskFilter, TaskPatch, UpdateUser, User};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    tasks: Vec<Task>,
    closed: bool,
}

impl Inner {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Unavailable("memory store is closed".to_string()));
        }
        Ok(())
    }

    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn push_user(&mut self, data: CreateUser) -> StoreResult<User> {
        if self.email_taken(&data.email, None) {
            return Err(StoreError::DuplicateEmail(data.email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());

        Ok(user)
    }
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;
        inner.push_user(data)
    }

    async fn insert_registered_user(&self, mut data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;

        if inner.users.is_empty() {
            data.role = Role::Manager;
        }
        inner.push_user(data)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;
        Ok(inner
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;
        Ok(inner.users.clone())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;
        Ok(inner.users.len() as i64)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;

        if !inner.user_exists(id) {
            return Ok(None);
        }

        if let Some(email) = &data.email {
            if inner.email_taken(email, Some(id)) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(role) = data.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;

        if inner
            .tasks
            .iter()
            .any(|t| t.assigned_to == id || t.created_by == id)
        {
            return Err(StoreError::UserInUse(id));
        }

        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        Ok(inner.users.len() < before)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;

        for reference in [data.assigned_to, data.created_by] {
            if !inner.user_exists(reference) {
                return Err(StoreError::MissingReference(reference));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            status: data.status,
            assigned_to: data.assigned_to,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.push(task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;
        Ok(inner.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        inner.ensure_open()?;

        // Reverse insertion order first so equal timestamps stay newest first
        let mut tasks: Vec<Task> = inner
            .tasks
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;

        if !inner.tasks.iter().any(|t| t.id == id) {
            return Ok(None);
        }

        if let Some(assignee) = patch.assigned_to {
            if !inner.user_exists(assignee) {
                debug!(task_id = %id, assignee = %assignee, "Rejecting update to missing assignee");
                return Err(StoreError::MissingReference(assignee));
            }
        }

        let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        patch.apply_to(task);

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        inner.ensure_open()?;

        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        Ok(inner.tasks.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.read().await.ensure_open()
    }

    async fn close(&self) {
        self.inner.write().await.closed = true;
        debug!("Memory store closed");
    }
}
