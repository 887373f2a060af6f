/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskly_api::{app::{build_router, AppState}, config::Config};
/// use taskly_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use taskly_shared::auth::{
    authorization,
    middleware::{authenticate, Session},
    password::HashCost,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Argon2id parameters for newly hashed passwords
    pub fn hash_cost(&self) -> HashCost {
        self.config.password.hash_cost()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                     # Health check (public)
/// └── /api/
///     ├── POST /register, /login      # Public
///     ├── POST /logout, GET /user     # Authenticated
///     ├── /categories                 # Authenticated
///     ├── /tasks[/:id]                # Authenticated, owner-scoped
///     └── /admin/                     # Authenticated + admin
///         ├── /users[/:id[/admin]]
///         ├── /tasks[/:id]
///         └── GET /dashboard-stats
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication and admin gate (per route group)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let admin_routes = Router::new()
        .route(
            "/users",
            get(routes::admin::list_users).post(routes::admin::create_user),
        )
        .route(
            "/users/:id",
            get(routes::admin::show_user)
                .put(routes::admin::update_user)
                .delete(routes::admin::delete_user),
        )
        .route("/users/:id/admin", put(routes::admin::set_user_role))
        .route("/tasks", get(routes::admin::list_tasks))
        .route(
            "/tasks/:id",
            get(routes::admin::show_task)
                .put(routes::admin::update_task)
                .delete(routes::admin::delete_task),
        )
        .route("/dashboard-stats", get(routes::admin::dashboard_stats))
        .layer(middleware::from_fn(require_admin));

    let authenticated_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/user", get(routes::auth::current_user))
        .route(
            "/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::show_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(authenticated_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Configures CORS from `CORS_ORIGINS`
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
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
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Authentication layer
///
/// Resolves the bearer token and inserts the [`Session`] into the request
/// extensions; anything else is a 401.
async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = authenticate(&state.db, req.headers()).await?;
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Admin gate
///
/// Runs inside the authentication layer and applies the admin policy to
/// every admin route.
async fn require_admin(session: Session, req: Request, next: Next) -> Result<Response, ApiError> {
    if let Err(e) = authorization::require_admin(&session) {
        tracing::warn!(
            user_id = %session.user_id(),
            path = %req.uri().path(),
            "Non-admin denied access to admin route"
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}
