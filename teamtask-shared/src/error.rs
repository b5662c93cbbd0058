/// Core error taxonomy
///
/// Every failure that crosses from the core into a request handler is one of
/// these kinds. The HTTP layer maps them to status codes:
///
/// | Kind | Status |
/// |---|---|
/// | `Validation` | 400 |
/// | `Authentication` | 401 |
/// | `Authorization` | 403 |
/// | `NotFound` | 404 |
/// | `Integrity` | 404 |
/// | `Internal` | 500 |

use crate::{
    auth::{jwt::JwtError, password::PasswordError, policy::AuthzError},
    store::StoreError,
};

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Bad or missing input, duplicate email, unknown enum value
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired token, or bad credentials
    #[error("{0}")]
    Authentication(String),

    /// Valid actor without the rights for this action
    #[error("{0}")]
    Authorization(String),

    /// Resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// A referenced user does not exist
    #[error("{0}")]
    Integrity(String),

    /// Anything unexpected (store failure, hashing failure)
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::Authentication(_) => "authentication",
            CoreError::Authorization(_) => "authorization",
            CoreError::NotFound(_) => "not_found",
            CoreError::Integrity(_) => "integrity",
            CoreError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => CoreError::Validation("User already exists".to_string()),
            StoreError::MissingReference(_) => CoreError::Integrity("User not found".to_string()),
            StoreError::UserInUse(_) => CoreError::Validation(
                "User still has tasks; reassign or delete them first".to_string(),
            ),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

impl From<AuthzError> for CoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::SelfDelete => CoreError::Validation(err.to_string()),
            _ => CoreError::Authorization(err.to_string()),
        }
    }
}

impl From<PasswordError> for CoreError {
    fn from(err: PasswordError) -> Self {
        CoreError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for CoreError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(_) | JwtError::InvalidLifetime(_) => {
                CoreError::Internal(err.to_string())
            }
            _ => CoreError::Authentication("Not authorized, token failed".to_string()),
        }
    }
}
