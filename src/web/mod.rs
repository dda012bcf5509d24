//! HTTP surface: routes, shared state and the middleware stack.

pub mod auth;
pub mod error;
pub mod handlers;

use crate::components::{CalendarApi, OAuthProvider, SessionStore};
use crate::config::Config;
use crate::error::{config_error, AppResult};
use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::Key;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use self::handlers::{
    auth_callback_handler, auth_probe_handler, begin_auth_handler, booking_handler,
    calendar_handler, login_handler, logout_handler, ping_handler,
};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub oauth: Arc<dyn OAuthProvider>,
    pub calendar: Arc<dyn CalendarApi>,
    pub sessions: SessionStore,
    cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: Config,
        oauth: Arc<dyn OAuthProvider>,
        calendar: Arc<dyn CalendarApi>,
    ) -> Self {
        // Config guarantees the secret is long enough to derive from
        let cookie_key = match &config.session_secret {
            Some(secret) => Key::derive_from(secret.as_bytes()),
            None => Key::generate(),
        };
        let sessions = SessionStore::new(chrono::Duration::minutes(config.session_ttl_minutes));

        Self {
            config: Arc::new(config),
            oauth,
            calendar,
            sessions,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// All routes, without state or middleware
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/auth/google", get(begin_auth_handler).head(auth_probe_handler))
        .route("/auth/google/callback", get(auth_callback_handler))
        .route("/login", get(login_handler))
        .route("/logout", get(logout_handler))
        .route("/booking", get(booking_handler))
        .route("/calendar", get(calendar_handler))
}

/// Wrap a router in the panic guard, request tracing and CORS
pub fn with_middleware(router: Router, config: &Config) -> AppResult<Router> {
    let mut router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = &config.cors_origin {
        router = router.layer(cors_layer(origin)?);
    }

    Ok(router)
}

/// The complete application
pub fn app(state: AppState) -> AppResult<Router> {
    let config = Arc::clone(&state.config);
    with_middleware(routes().with_state(state), &config)
}

/// CORS policy for the single allowed browser origin
fn cors_layer(origin: &str) -> AppResult<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|e| config_error(&format!("Invalid CORS origin {}: {}", origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Generic 500 for anything a handler did not handle
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Unhandled error in request handler: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}
