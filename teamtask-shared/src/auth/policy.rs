/// Authorization policy
///
/// Pure decision functions: given the acting identity and the resource, they
/// allow or deny, and say which task fields the actor may write. Nothing here
/// touches the store; callers load the resource first so that "not found" is
/// decided before "not authorized".
///
/// | Action | Manager | Regular user |
/// |---|---|---|
/// | List tasks | all tasks | tasks assigned to self |
/// | Read task | allowed | only if assigned to self |
/// | Create task | allowed, creator forced to self | denied |
/// | Update task | any field | own task, `status` only, all-or-nothing |
/// | Delete task | allowed | denied |
/// | Manage users | allowed, except deleting self | denied |

use uuid::Uuid;

use crate::models::{Role, Task, TaskField, TaskFilter, User};

/// The identity a request acts as
///
/// Built from a freshly loaded user row, never from token contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor::new(user.id, user.role)
    }
}

/// Error type for authorization decisions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Action reserved for managers
    #[error("Only managers can {0}")]
    ManagerOnly(&'static str),

    /// Task exists but is assigned to someone else
    #[error("Not authorized to {0} this task")]
    NotAssignee(&'static str),

    /// Regular user tried to write a field other than `status`
    #[error("Regular users can only update task status (got '{0}')")]
    FieldNotAllowed(String),

    /// Manager tried to delete the account making the request
    #[error("You cannot delete your own account")]
    SelfDelete,
}

/// Task fields the actor may write on a task they are allowed to update
pub fn writable_task_fields(actor: &Actor) -> &'static [TaskField] {
    if actor.is_manager() {
        &TaskField::ALL
    } else {
        &[TaskField::Status]
    }
}

/// Visibility filter for task listings
///
/// Managers see everything; regular users only what is assigned to them.
pub fn task_visibility(actor: &Actor) -> TaskFilter {
    if actor.is_manager() {
        TaskFilter::all()
    } else {
        TaskFilter {
            assigned_to: Some(actor.id),
            status: None,
        }
    }
}

pub fn authorize_task_read(actor: &Actor, task: &Task) -> Result<(), AuthzError> {
    if actor.is_manager() || task.assigned_to == actor.id {
        Ok(())
    } else {
        Err(AuthzError::NotAssignee("view"))
    }
}

pub fn authorize_task_create(actor: &Actor) -> Result<(), AuthzError> {
    require_manager(actor, "create tasks")
}

/// Decides a task update from the set of keys present in the request body
///
/// For a regular user every key must be writable by them; a single other key
/// rejects the whole update. Keys are checked as raw strings so that unknown
/// keys are refused too.
pub fn authorize_task_update<'a, I>(actor: &Actor, task: &Task, keys: I) -> Result<(), AuthzError>
where
    I: IntoIterator<Item = &'a str>,
{
    if actor.is_manager() {
        return Ok(());
    }

    if task.assigned_to != actor.id {
        return Err(AuthzError::NotAssignee("update"));
    }

    let allowed = writable_task_fields(actor);
    for key in keys {
        let permitted = TaskField::from_key(key).is_some_and(|f| allowed.contains(&f));
        if !permitted {
            return Err(AuthzError::FieldNotAllowed(key.to_string()));
        }
    }

    Ok(())
}

pub fn authorize_task_delete(actor: &Actor) -> Result<(), AuthzError> {
    require_manager(actor, "delete tasks")
}

/// Listing, reading, creating and updating user accounts
pub fn authorize_user_management(actor: &Actor) -> Result<(), AuthzError> {
    require_manager(actor, "manage users")
}

pub fn authorize_user_delete(actor: &Actor, target: Uuid) -> Result<(), AuthzError> {
    authorize_user_management(actor)?;

    if actor.id == target {
        return Err(AuthzError::SelfDelete);
    }

    Ok(())
}

fn require_manager(actor: &Actor, action: &'static str) -> Result<(), AuthzError> {
    if actor.is_manager() {
        Ok(())
    } else {
        Err(AuthzError::ManagerOnly(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use chrono::Utc;

    fn manager() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Manager)
    }

    fn member() -> Actor {
        Actor::new(Uuid::new_v4(), Role::User)
    }

    fn task_for(assignee: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "T".to_string(),
            description: None,
            status: TaskStatus::Todo,
            assigned_to: assignee,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility() {
        assert_eq!(task_visibility(&manager()), TaskFilter::all());

        let user = member();
        let filter = task_visibility(&user);
        assert_eq!(filter.assigned_to, Some(user.id));
        assert!(filter.matches(&task_for(user.id)));
        assert!(!filter.matches(&task_for(Uuid::new_v4())));
    }

    #[test]
    fn test_read() {
        let user = member();
        assert!(authorize_task_read(&user, &task_for(user.id)).is_ok());
        assert_eq!(
            authorize_task_read(&user, &task_for(Uuid::new_v4())),
            Err(AuthzError::NotAssignee("view"))
        );
        assert!(authorize_task_read(&manager(), &task_for(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn test_create_and_delete_are_manager_only() {
        assert!(authorize_task_create(&manager()).is_ok());
        assert!(authorize_task_delete(&manager()).is_ok());
        assert!(matches!(authorize_task_create(&member()), Err(AuthzError::ManagerOnly(_))));
        assert!(matches!(authorize_task_delete(&member()), Err(AuthzError::ManagerOnly(_))));
    }

    #[test]
    fn test_user_may_update_only_status_of_own_task() {
        let user = member();
        let own = task_for(user.id);

        assert!(authorize_task_update(&user, &own, ["status"]).is_ok());
        assert!(authorize_task_update(&user, &own, std::iter::empty::<&str>()).is_ok());

        assert_eq!(
            authorize_task_update(&user, &own, ["status", "title"]),
            Err(AuthzError::FieldNotAllowed("title".to_string()))
        );
        assert_eq!(
            authorize_task_update(&user, &own, ["createdBy"]),
            Err(AuthzError::FieldNotAllowed("createdBy".to_string()))
        );

        let other = task_for(Uuid::new_v4());
        assert_eq!(
            authorize_task_update(&user, &other, ["status"]),
            Err(AuthzError::NotAssignee("update"))
        );
    }

    #[test]
    fn test_manager_may_update_any_field() {
        let task = task_for(Uuid::new_v4());
        assert!(authorize_task_update(
            &manager(),
            &task,
            ["title", "description", "status", "assignedTo"]
        )
        .is_ok());
    }

    #[test]
    fn test_writable_fields() {
        assert_eq!(writable_task_fields(&member()), &[TaskField::Status]);
        assert_eq!(writable_task_fields(&manager()).len(), 4);
    }

    #[test]
    fn test_user_management() {
        let boss = manager();
        assert!(authorize_user_management(&boss).is_ok());
        assert!(authorize_user_management(&member()).is_err());

        assert!(authorize_user_delete(&boss, Uuid::new_v4()).is_ok());
        assert_eq!(authorize_user_delete(&boss, boss.id), Err(AuthzError::SelfDelete));

        let user = member();
        assert!(matches!(
            authorize_user_delete(&user, user.id),
            Err(AuthzError::ManagerOnly(_))
        ));
    }
}
