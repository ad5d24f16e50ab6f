use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// App Router Module
///
/// The private surface nested under `/app`. No per-route auth layer is
/// attached here: the router-wide Route Guard has already redirected any
/// request without an authenticated session cookie to `/login`, carrying the
/// original path in the `redirect` query parameter.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        // GET /app/dashboard
        // The default authenticated landing page (also the target the guard
        // sends signed-in users to when they revisit /login).
        .route("/dashboard", get(handlers::dashboard))
        // GET /app/settings
        // Account settings page stub.
        .route("/settings", get(handlers::settings))
}
