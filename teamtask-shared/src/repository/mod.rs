/// Repositories over the [`Store`](crate::store::Store)
///
/// Repositories hold the invariants that span more than one record and
/// translate store outcomes into [`CoreError`](crate::error::CoreError):
///
/// - [`TaskRepository`]: referenced users must exist; both references are
///   expanded to `{id, name, email}` on the way out
/// - [`CredentialRepository`]: emails are unique, passwords are hashed on the
///   way in and never leave except for the login check

pub mod credentials;
pub mod tasks;

pub use credentials::{CredentialRepository, NewUser};
pub use tasks::TaskRepository;
