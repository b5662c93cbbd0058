/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the password length rule
/// - [`jwt`]: signed, time-limited identity tokens
/// - [`policy`]: pure allow/deny decisions for tasks and users
/// - [`middleware`]: bearer token → [`middleware::AuthContext`] resolution
///
/// # Example
///
/// ```
/// use teamtask_shared::auth::jwt::TokenIssuer;
/// use teamtask_shared::auth::password::{hash_password, verify_password};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("hunter22")?;
/// assert!(verify_password("hunter22", &hash)?);
///
/// let issuer = TokenIssuer::new("a-secret-of-at-least-thirty-two-bytes!!", Duration::hours(1));
/// let token = issuer.issue(Uuid::new_v4())?;
/// assert!(issuer.verify(&token).is_some());
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
