use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::{AppConfig, SecurityConfig, StorageBackend};
use crate::database::{DatabaseError, DatabaseManager, PgDirectory, PgLedger};
use crate::enrollment::{memory, Directory, EnrollmentCoordinator, EnrollmentLedger};
use crate::fixture::{Fixture, FixtureError};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin, require_instructor, require_student};

/// Token settings the handlers and the auth middleware need
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub admin_user: String,
    pub admin_password_hash: Option<String>,
}

impl AuthSettings {
    pub fn from_config(security: &SecurityConfig) -> Self {
        Self {
            jwt_secret: security.jwt_secret.clone(),
            jwt_expiry_hours: security.jwt_expiry_hours,
            admin_user: security.admin_user.clone(),
            admin_password_hash: security.admin_password_hash.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<EnrollmentCoordinator>,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(directory: Arc<dyn Directory>, ledger: Arc<dyn EnrollmentLedger>, auth: AuthSettings) -> Self {
        Self {
            coordinator: Arc::new(EnrollmentCoordinator::new(directory, ledger)),
            auth: Arc::new(auth),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// Directory and ledger selected by `storage.backend`
pub struct Storage {
    pub directory: Arc<dyn Directory>,
    pub ledger: Arc<dyn EnrollmentLedger>,
    /// Present for the postgres backend so the caller can close the pool
    pub database: Option<DatabaseManager>,
}

pub async fn open_storage(config: &AppConfig) -> Result<Storage, StorageError> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let database = DatabaseManager::from_config(&config.database).await?;
            let pool = database.pool().clone();
            Ok(Storage {
                directory: Arc::new(PgDirectory::new(pool.clone())),
                ledger: Arc::new(PgLedger::new(pool)),
                database: Some(database),
            })
        }
        StorageBackend::Memory => {
            let fixture = match &config.storage.fixture {
                Some(path) => Fixture::load(path)?,
                None => Fixture::default(),
            };
            let (directory, ledger) = memory::open(&fixture)?;
            info!(
                students = fixture.students.len(),
                sections = fixture.sections.len(),
                "in-memory storage ready"
            );
            Ok(Storage {
                directory,
                ledger,
                database: None,
            })
        }
    }
}

/// Routes with auth gates and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/login", post(public::auth::login))
        // Protected
        .merge(student_routes(state.clone()))
        .merge(instructor_routes(state.clone()))
        // Elevated
        .merge(admin_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `router` plus CORS and the request timeout from config
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut app = router(state).layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)));
    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    app
}

fn student_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/registration/register", post(protected::registration::register))
        .route("/api/registration/drop", delete(protected::registration::drop))
        .route("/api/registration/courses", get(protected::registration::courses))
        .route("/api/students/transcript", get(protected::student::transcript))
        .route("/api/students/courses", get(protected::student::current_courses))
        .route_layer(from_fn(require_student))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn instructor_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/instructors/grade", put(protected::instructor::grade))
        .route("/api/instructors/sections", get(protected::instructor::sections))
        .route("/api/instructors/sections/students", get(protected::instructor::section_students))
        .route_layer(from_fn(require_instructor))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/students/:id/transcript", get(elevated::admin::student_transcript))
        .route("/api/admin/sections/:id/seats", get(elevated::admin::section_seats))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
