//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskflow_api::{app::{build_router, AppState}, config::Config};
//! use taskflow_shared::mail::logging::LogMailer;
//! use sqlx::PgPool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let state = AppState::new(pool, config, Arc::new(LogMailer::new()));
//!
//! let app = build_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskflow_shared::{
    auth::middleware::jwt_auth_middleware,
    mail::Mailer,
    services::{
        analytics::AnalyticsService, notifications::NotificationService, tasks::TaskService,
    },
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn tasks(&self) -> TaskService {
        TaskService::new(self.db.clone(), self.mailer.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.db.clone())
    }

    pub fn analytics(&self) -> AnalyticsService {
        AnalyticsService::new(self.db.clone())
    }
}

/// Builds the router with all routes and middleware.
///
/// ```text
/// /health                                 public
/// /api/auth/login                POST     public
/// /api/auth/register             POST     public
/// /api/auth/get-all              GET      bearer
/// /api/auth/update/:id           PUT      bearer
/// /api/auth/delete/:id           DELETE   bearer
/// /api/task/create               POST     bearer
/// /api/task/get-all              GET      bearer
/// /api/task/get/:id              GET      bearer
/// /api/task/update/:id           PUT      bearer
/// /api/task/upt-status/:taskId   PATCH    bearer
/// /api/task/delete/:id           DELETE   bearer
/// /api/notification/user/:userId GET      bearer
/// /api/notification/:id/seen     PUT      bearer
/// /api/notification/admin/all    GET      bearer
/// /api/analytics/dashboard       GET      bearer
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/register", post(routes::auth::register));

    let user_routes = Router::new()
        .route("/get-all", get(routes::auth::list_users))
        .route("/update/:id", put(routes::auth::update_user))
        .route("/delete/:id", delete(routes::auth::delete_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let task_routes = Router::new()
        .route("/create", post(routes::tasks::create_task))
        .route("/get-all", get(routes::tasks::list_tasks))
        .route("/get/:id", get(routes::tasks::get_task))
        .route("/update/:id", put(routes::tasks::update_task))
        .route("/upt-status/:task_id", patch(routes::tasks::update_task_status))
        .route("/delete/:id", delete(routes::tasks::delete_task))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let notification_routes = Router::new()
        .route("/user/:user_id", get(routes::notifications::list_user_notifications))
        .route("/:id/seen", put(routes::notifications::mark_seen))
        .route("/admin/all", get(routes::notifications::list_all_notifications))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let analytics_routes = Router::new()
        .route("/dashboard", get(routes::analytics::dashboard))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(user_routes))
        .nest("/task", task_routes)
        .nest("/notification", notification_routes)
        .nest("/analytics", analytics_routes);

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Validates the bearer token and injects `AuthContext` into the request
/// extensions. Any failure is a 401.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    jwt_auth_middleware(state.config.jwt.secret.clone(), req, next)
        .await
        .map_err(ApiError::from)
}
