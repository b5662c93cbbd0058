/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use teamtask_api::{app::{build_router, connect_store, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = connect_store(&config).await?;
/// let state = AppState::new(store, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, StoreBackend},
    middleware::{
        auth::{require_auth, require_manager, require_task_manager},
        errors::expose_internal_errors,
        security::SecurityHeadersLayer,
    },
};
use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use teamtask_shared::{
    auth::jwt::TokenIssuer,
    db::pool::{create_pool, DatabaseConfig},
    repository::{CredentialRepository, TaskRepository},
    store::{MemoryStore, PgStore, Store},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Everything inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Backing store, also used directly for health checks and auth lookups
    pub store: Arc<dyn Store>,

    pub tasks: TaskRepository,

    pub users: CredentialRepository,

    /// Token issuer built from the JWT configuration
    pub tokens: TokenIssuer,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            tasks: TaskRepository::new(store.clone()),
            users: CredentialRepository::new(store.clone()),
            tokens: TokenIssuer::new(config.jwt.secret.clone(), config.jwt.lifetime),
            store,
            config: Arc::new(config),
        }
    }
}

/// Opens the configured store
///
/// For PostgreSQL this connects the pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .clone()
                .context("DATABASE_URL environment variable is required")?;

            let pool = create_pool(DatabaseConfig {
                url,
                max_connections: config.store.max_connections,
                connect_timeout_seconds: config.store.connect_timeout_seconds,
                ..Default::default()
            })
            .await
            .context("Failed to connect to PostgreSQL")?;

            let store = PgStore::new(pool);
            store.migrate().await.context("Failed to run database migrations")?;

            Ok(Arc::new(store))
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register    # public
///     │   ├── POST /login       # public
///     │   ├── GET  /me
///     │   └── PUT  /me
///     ├── /tasks/               # authenticated
///     │   ├── GET    /
///     │   ├── POST   /          # manager
///     │   ├── GET    /status/:status
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   └── DELETE /:id       # manager
///     └── /users/               # authenticated, manager
///         ├── GET  /
///         ├── POST /
///         ├── GET    /:id
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Internal error details (non-production only)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
/// 5. Authentication and the manager gate (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth = || from_fn_with_state(state.clone(), require_auth);

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me).put(routes::auth::update_me))
        .route_layer(auth())
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    // Create and delete are manager-only, gated before extraction
    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/status/:status", get(routes::tasks::list_tasks_by_status))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(from_fn(require_task_manager))
        .route_layer(auth());

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route_layer(from_fn(require_manager))
        .route_layer(auth());

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/users", user_routes);

    let production = state.config.api.is_production();
    let cors = cors_layer(&state.config.api.cors_origins);

    let mut router = Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .with_state(state);

    if !production {
        router = router.layer(from_fn(expose_internal_errors));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
}

/// Permissive CORS for `*`, otherwise the listed origins only
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
