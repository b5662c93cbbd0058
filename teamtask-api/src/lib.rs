//! # TeamTask API Server Library
//!
//! HTTP surface of TeamTask: a JSON API over the task/user core in
//! `teamtask-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state, store connection and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors with enveloped rejections
//! - `middleware`: Authentication, error detail and security headers
//! - `response`: Success envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
