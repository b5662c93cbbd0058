/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, own profile
/// - `tasks`: Task CRUD with role-based visibility and field restrictions
/// - `users`: Account management (managers only)

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
