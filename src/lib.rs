use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core session subsystem: pure codec, stateful store, per-request guard.
pub mod cookie;
pub mod guard;
pub mod store;
pub mod token;

// Application glue.
pub mod config;
pub mod handlers;
pub mod models;

// Module for routing segregation (public surface vs. guarded /app surface).
pub mod routes;
use routes::{app, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use store::{BackendState, MemorySessionBackend, SessionStore};
pub use token::{HttpTokenService, MockTokenService, TokenState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the gateway.
/// It aggregates all paths and schemas decorated with the `#[utoipa::path]`
/// and `#[derive(utoipa::ToSchema)]` macros. The resulting JSON is served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::register, handlers::logout,
        handlers::get_session, handlers::dashboard, handlers::settings
    ),
    components(
        schemas(
            models::User, models::LoginRequest, models::RegisterRequest,
            models::SessionResponse, models::LoginResponse,
        )
    ),
    tags(
        (name = "offerhub-gateway", description = "OFFER HUB session gateway API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe
/// container holding all essential application services and configuration,
/// shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// The composition-root session object (single writer of the persisted record).
    pub store: Arc<SessionStore>,
    /// The external token collaborator (issue/revoke).
    pub tokens: TokenState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and middleware to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for Arc<SessionStore> {
    fn from_ref(app_state: &AppState) -> Arc<SessionStore> {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gateway's entire routing structure, applies the router-wide
/// Route Guard plus the observability layers, and registers the application
/// state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public surface: auth entry points, session introspection, health.
        .merge(public::public_routes())
        // Private surface, nested under the guarded /app prefix.
        .nest("/app", app::app_routes())
        // Route Guard: runs on every request (minus the matcher exclusions
        // handled inside), before any handler. Read-only by contract.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::route_guard,
        ))
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a
                // span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns x-request-id to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize span creation. It
/// extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI, so every
/// log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
