/// Credential repository
///
/// Owns everything that touches a password: registration and manager-side
/// creation hash the plaintext, login verifies it. Every other read returns a
/// [`UserProfile`], which has no password field at all.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    auth::password::{hash_password, validate_password_length, verify_password},
    error::{CoreError, CoreResult},
    models::{CreateUser, Role, UpdateUser, UserProfile},
    store::Store,
};

/// Account data with a plaintext password, before hashing
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Clone)]
pub struct CredentialRepository {
    store: Arc<dyn Store>,
}

impl CredentialRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<UserProfile>> {
        Ok(self.store.find_user_by_id(id).await?.map(|u| u.profile()))
    }

    pub async fn find_by_email(&self, email: &str) -> CoreResult<Option<UserProfile>> {
        Ok(self.store.find_user_by_email(email).await?.map(|u| u.profile()))
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<UserProfile> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))
    }

    /// All users, oldest first
    pub async fn list(&self) -> CoreResult<Vec<UserProfile>> {
        let users = self.store.list_users().await?;
        Ok(users.iter().map(|u| u.profile()).collect())
    }

    pub async fn count(&self) -> CoreResult<i64> {
        Ok(self.store.count_users().await?)
    }

    /// Self-registration
    ///
    /// The first account in an empty store becomes a manager; every later
    /// one is a regular user. The store decides this in the same write as
    /// the insert.
    pub async fn register(&self, name: String, email: String, password: String) -> CoreResult<UserProfile> {
        let data = self
            .prepare(NewUser {
                name,
                email,
                password,
                role: Role::User,
            })
            .await?;

        let user = self.store.insert_registered_user(data).await?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user.profile())
    }

    /// Creates an account with a hashed password
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank name, malformed email, bad password length
    ///   or an email already in use
    pub async fn create(&self, data: NewUser) -> CoreResult<UserProfile> {
        let data = self.prepare(data).await?;
        let user = self.store.insert_user(data).await?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user.profile())
    }

    /// Validates the input and hashes the password
    async fn prepare(&self, data: NewUser) -> CoreResult<CreateUser> {
        let name = data.name.trim().to_string();
        let email = data.email.trim().to_string();

        validate_name(&name)?;
        validate_email(&email)?;
        validate_password_length(&data.password).map_err(CoreError::Validation)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(CoreError::validation("User already exists"));
        }

        Ok(CreateUser {
            name,
            email,
            password_hash: hash_password(&data.password)?,
            role: data.role,
        })
    }

    /// Checks an email/password pair
    ///
    /// Unknown email and wrong password give the same error.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> CoreResult<UserProfile> {
        let invalid = || CoreError::Authentication("Invalid email or password".to_string());

        let Some(user) = self.store.find_user_by_email(email.trim()).await? else {
            return Err(invalid());
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }

        Ok(user.profile())
    }

    /// Applies name, email and role changes
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist
    /// - `Validation` for a blank name, malformed email or an email in use by
    ///   another account
    pub async fn update(&self, id: Uuid, mut data: UpdateUser) -> CoreResult<UserProfile> {
        if let Some(name) = data.name.as_mut() {
            *name = name.trim().to_string();
            validate_name(name)?;
        }
        if let Some(email) = data.email.as_mut() {
            *email = email.trim().to_string();
            validate_email(email)?;
        }

        let role_change = data.role;
        let user = self
            .store
            .update_user(id, data)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))?;

        if let Some(role) = role_change {
            info!(user_id = %id, role = %role, "User role set");
        }

        Ok(user.profile())
    }

    /// Deletes an account that no task references
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist
    /// - `Validation` if a task is still assigned to or created by the user
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        match self.store.delete_user(id).await {
            Ok(true) => {
                info!(user_id = %id, "User deleted");
                Ok(())
            }
            Ok(false) => Err(CoreError::not_found("User not found")),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::validation("Name is required"));
    }
    Ok(())
}

fn validate_email(email: &str) -> CoreResult<()> {
    if email.is_empty() {
        return Err(CoreError::validation("Email is required"));
    }
    if !email.validate_email() {
        return Err(CoreError::validation("Email is invalid"));
    }
    Ok(())
}
