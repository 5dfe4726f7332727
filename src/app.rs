use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{config, AppConfig};
use crate::database::Store;
use crate::handlers::{self, protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Build the full router with global middleware
pub fn app(state: AppState) -> Router {
    let config = config();

    let router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    let router = if config.api.enable_request_logging {
        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)),
        )
    } else {
        router.layer(cors_layer(config))
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::user_register))
        .route("/api/auth/login", post(auth::session_login))
        .route("/api/auth/token/refresh", post(auth::session_refresh))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, projects};

    Router::new()
        .route("/api/auth/logout", post(auth::session_logout))
        .route("/api/profile", get(protected::profile_get).put(protected::profile_put))
        .route(
            "/api/projects",
            get(projects::project_list).post(projects::project_create),
        )
        .route(
            "/api/projects/:id",
            get(projects::project_get)
                .patch(projects::project_patch)
                .delete(projects::project_delete),
        )
        .route("/api/notifications", get(protected::notifications_get))
        .route("/api/reward", get(protected::reward_get))
        // Outermost runs first: token check, then user lookup
        .route_layer(from_fn_with_state(state, validate_user_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        if crate::is_production!() {
            tracing::warn!("No CORS origins configured in production, allowing any origin");
        }
        CorsLayer::permissive()
    } else {
        CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
    }
}
