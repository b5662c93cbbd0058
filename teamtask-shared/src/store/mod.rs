/// Persistence seam for users and tasks
///
/// Handlers never touch a connection directly. They receive an
/// `Arc<dyn Store>` that was constructed, connected and health-checked at
/// startup and is closed at shutdown.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx, foreign keys enforce the
///   task → user references
/// - [`memory::MemoryStore`]: in-process maps behind a `RwLock`, used by
///   tests and `STORE_BACKEND=memory`
///
/// Both implementations honor the same contract:
///
/// - `insert_user` / `update_user` fail with [`StoreError::DuplicateEmail`]
///   when another user already has the email (exact match)
/// - `insert_task` / `update_task` fail with [`StoreError::MissingReference`]
///   when `assigned_to` or `created_by` names no user; nothing is written
/// - `delete_user` fails with [`StoreError::UserInUse`] while any task still
///   references the user
/// - `insert_registered_user` decides the bootstrap role in the same atomic
///   write as the insert, so concurrent registrations into an empty store
///   yield exactly one manager
/// - `update_user` on an unknown id returns `Ok(None)`, whatever the data
/// - `list_tasks` returns newest first

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CreateTask, CreateUser, Task, TaskFilter, TaskPatch, UpdateUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email is already registered to another user
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Task references a user that does not exist
    #[error("Referenced user {0} does not exist")]
    MissingReference(Uuid),

    /// User is still referenced by at least one task
    #[error("User {0} is still referenced by tasks")]
    UserInUse(Uuid),

    /// Store has been closed or cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Underlying database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Credential records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Inserts a self-registered user
    ///
    /// The role is `Manager` if the store holds no user yet and `data.role`
    /// otherwise, checked atomically with the insert.
    async fn insert_registered_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact, case-sensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Users among `ids` that exist, in no particular order
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// All users, oldest first
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn count_users(&self) -> StoreResult<i64>;

    /// Returns `None` if no user has this id
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Returns `false` if no user has this id
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
}

/// Task records
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks matching `filter`, newest first
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;

    /// Returns `None` if no task has this id
    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>>;

    /// Returns `false` if no task has this id
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

/// A connected store with an explicit lifecycle
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;

    /// Releases connections; later calls fail with [`StoreError::Unavailable`]
    /// or a database error
    async fn close(&self);
}
