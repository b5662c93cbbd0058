/// Domain models for TeamTask
///
/// # Models
///
/// - `user`: credential records, roles and their public projections
/// - `task`: tasks, the status vocabulary, patches and list filters
///
/// Models are plain data. Reads and writes go through the [`crate::store`]
/// traits; invariants that span both models live in [`crate::repository`].

pub mod task;
pub mod user;

pub use task::{CreateTask, NewTask, Task, TaskField, TaskFilter, TaskPatch, TaskStatus, TaskView};
pub use user::{CreateUser, Role, UpdateUser, User, UserProfile, UserSummary};
