/// PostgreSQL store
///
/// Wraps a sqlx `PgPool`. Referential integrity is enforced by the schema
/// (see `migrations/`): a foreign key violation on a task write becomes
/// [`StoreError::MissingReference`], and one on a user delete becomes
/// [`StoreError::UserInUse`]. Email uniqueness is a UNIQUE constraint with
/// exact matching.
///
/// # Example
///
/// ```no_run
/// use teamtask_shared::db::pool::{create_pool, DatabaseConfig};
/// use teamtask_shared::store::{PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgStore::new(pool);
/// store.migrate().await?;
/// store.health_check().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::{
    db::{migrations, pool},
    models::{CreateTask, CreateUser, Task, TaskFilter, TaskPatch, UpdateUser, User},
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, title, description, status, assigned_to, created_by, created_at, updated_at";

/// Advisory lock key serializing self-registrations
const REGISTRATION_LOCK_KEY: i64 = 0x7465_616d_7461_736b;

/// Store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        migrations::run_migrations(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations on `users.email` to [`StoreError::DuplicateEmail`]
fn map_user_write_error(err: sqlx::Error, email: Option<&str>) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateEmail(email.unwrap_or_default().to_string());
        }
    }
    StoreError::Database(err)
}

/// Maps foreign key violations on `tasks` to [`StoreError::MissingReference`]
fn map_task_write_error(err: sqlx::Error, reference: Uuid) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(reference);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(data.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_user_write_error(e, Some(&data.email)))
    }

    async fn insert_registered_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        // Held until commit; the INSERT below takes its snapshot after any
        // earlier registration has committed
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REGISTRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO users (name, email, password_hash, role)
             SELECT $1, $2, $3,
                    CASE WHEN EXISTS (SELECT 1 FROM users) THEN $4::text ELSE 'manager' END
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(data.role.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_user_write_error(e, Some(&data.email)))?;

        tx.commit().await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");

        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");

        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = &data.name {
            q = q.bind(name);
        }
        if let Some(email) = &data.email {
            q = q.bind(email);
        }
        if let Some(role) = data.role {
            q = q.bind(role.as_str());
        }

        q.fetch_optional(&self.pool)
            .await
            .map_err(|e| map_user_write_error(e, data.email.as_deref()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let in_use = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation()
                );
                if in_use {
                    StoreError::UserInUse(id)
                } else {
                    StoreError::Database(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let query = format!(
            "INSERT INTO tasks (title, description, status, assigned_to, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.status.as_str())
            .bind(data.assigned_to)
            .bind(data.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_task_write_error(e, data.assigned_to))
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        // NULL parameters disable their predicate
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE ($1::uuid IS NULL OR assigned_to = $1)
               AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC"
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(filter.assigned_to)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if patch.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if patch.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = &patch.title {
            q = q.bind(title);
        }
        if let Some(description) = &patch.description {
            q = q.bind(description);
        }
        if let Some(status) = patch.status {
            q = q.bind(status.as_str());
        }
        if let Some(assignee) = patch.assigned_to {
            q = q.bind(assignee);
        }

        q.fetch_optional(&self.pool)
            .await
            .map_err(|e| map_task_write_error(e, patch.assigned_to.unwrap_or(id)))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        pool::health_check(&self.pool).await.map_err(|e| {
            warn!(error = %e, "PostgreSQL health check failed");
            StoreError::Database(e)
        })
    }

    async fn close(&self) {
        pool::close_pool(&self.pool).await;
    }
}
