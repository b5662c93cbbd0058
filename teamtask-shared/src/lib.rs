//! # TeamTask Shared Library
//!
//! Domain core of the TeamTask API: everything that decides who may do what
//! to which task, independent of HTTP.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks, status vocabulary, partial updates
//! - `auth`: identity tokens, password hashing, authorization policy,
//!   request authentication
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `repository`: task and credential repositories over a store
//! - `db`: connection pool and migrations
//! - `error`: core error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;

/// Current version of the TeamTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
