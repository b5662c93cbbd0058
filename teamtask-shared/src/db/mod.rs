/// PostgreSQL plumbing for [`crate::store::PgStore`]
///
/// # Modules
///
/// - `pool`: connection pool creation, health check and shutdown
/// - `migrations`: schema migrations embedded from the workspace `migrations/`
///   directory

pub mod migrations;
pub mod pool;
